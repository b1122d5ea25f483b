use mapmorph::{ExecutionConfig, Mapping, TransformErrorKind, execute};
use serde_json::json;

fn measurement_mapping() -> Mapping {
    serde_json::from_value(json!({
        "id": "m1",
        "name": "temperature",
        "targetAPI": "MEASUREMENT",
        "subscriptionTopic": "device/#",
        "templateTopic": "device/+",
        "templateTopicSample": "device/110",
        "source": "{\"id\": \"909090\", \"temp\": 21.5}",
        "target": "{}",
        "substitutions": [
            {"pathSource": "$.temp", "pathTarget": "c8y_Temperature.value"},
            {"pathSource": "$.id", "pathTarget": "source.id"}
        ]
    }))
    .unwrap()
}

#[test]
fn applies_all_substitutions_and_stamps_time() {
    let mapping = measurement_mapping();
    let result = execute(
        r#"{"id": "1234", "temp": 21.5}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();

    assert_eq!(result.errors, Vec::<String>::new());
    assert_eq!(result.payloads.len(), 1);
    let payload = result.payload();
    assert_eq!(payload["source"]["id"], json!("1234"));
    assert_eq!(payload["c8y_Temperature"]["value"], json!(21.5));
    assert!(payload["time"].as_str().is_some_and(|t| !t.is_empty()));
}

#[test]
fn missing_device_identifier_is_reported_not_fatal() {
    let mapping = measurement_mapping();
    let result = execute(r#"{"temp": 21.5}"#, &mapping, &ExecutionConfig::default()).unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("$.id"));
    let payload = result.payload();
    assert!(payload.get("source").is_none());
    assert_eq!(payload["c8y_Temperature"]["value"], json!(21.5));
}

#[test]
fn repeated_execution_is_stable_modulo_time() {
    let mapping = measurement_mapping();
    let config = ExecutionConfig::default();
    let source = r#"{"id": "1234", "temp": 21.5}"#;

    let mut first = execute(source, &mapping, &config).unwrap();
    let mut second = execute(source, &mapping, &config).unwrap();
    for result in [&mut first, &mut second] {
        for payload in &mut result.payloads {
            payload.as_object_mut().unwrap().remove("time");
        }
    }
    assert_eq!(first, second);
}

#[test]
fn malformed_payload_is_fatal() {
    let mapping = measurement_mapping();
    let err = execute("{not json", &mapping, &ExecutionConfig::default()).unwrap_err();
    assert_eq!(err.kind, TransformErrorKind::MalformedSourcePayload);
}

#[test]
fn unknown_target_api_is_fatal() {
    let mut mapping = measurement_mapping();
    mapping.target_api = serde_json::from_value(json!("WEBHOOK")).unwrap();
    let err = execute(r#"{"id": "1"}"#, &mapping, &ExecutionConfig::default()).unwrap_err();
    assert_eq!(err.kind, TransformErrorKind::UnsupportedTargetKind);
}

#[test]
fn unparseable_target_path_is_fatal() {
    let mut mapping = measurement_mapping();
    mapping.substitutions[0].path_target = "c8y_Temperature..value".to_string();
    let err = execute(r#"{"id": "1"}"#, &mapping, &ExecutionConfig::default()).unwrap_err();
    assert_eq!(err.kind, TransformErrorKind::InvalidExpression);
    assert_eq!(err.path.as_deref(), Some("c8y_Temperature..value"));
}

#[test]
fn substituted_time_is_not_overwritten() {
    let mut mapping = measurement_mapping();
    mapping.substitutions.push(
        serde_json::from_value(json!({"pathSource": "$.ts", "pathTarget": "time"})).unwrap(),
    );
    let result = execute(
        r#"{"id": "1234", "temp": 21.5, "ts": "2026-08-24T10:00:00.000Z"}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();
    assert_eq!(result.payload()["time"], json!("2026-08-24T10:00:00.000Z"));
}

#[test]
fn repair_strategies_for_missing_and_array_values() {
    let mut mapping = measurement_mapping();
    mapping.substitutions = vec![
        serde_json::from_value(json!({"pathSource": "$.id", "pathTarget": "source.id"})).unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.values",
            "pathTarget": "first",
            "repairStrategy": "USE_FIRST_VALUE_OF_ARRAY"
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.values",
            "pathTarget": "last",
            "repairStrategy": "USE_LAST_VALUE_OF_ARRAY"
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.absent",
            "pathTarget": "optional",
            "repairStrategy": "IGNORE"
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.absent",
            "pathTarget": "first",
            "repairStrategy": "REMOVE_IF_MISSING"
        }))
        .unwrap(),
    ];

    let result = execute(
        r#"{"id": "1234", "values": [1, 2, 3]}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();

    assert_eq!(result.errors, Vec::<String>::new());
    let payload = result.payload();
    // USE_FIRST wrote 1, then REMOVE_IF_MISSING erased it again
    assert!(payload.get("first").is_none());
    assert_eq!(payload["last"], json!(3));
    assert!(payload.get("optional").is_none());
}

#[test]
fn default_strategy_reports_missing_source_values() {
    let mut mapping = measurement_mapping();
    mapping.substitutions.push(
        serde_json::from_value(json!({"pathSource": "$.absent", "pathTarget": "extra"})).unwrap(),
    );
    let result = execute(
        r#"{"id": "1234", "temp": 21.5}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("$.absent"));
    assert!(result.payload().get("extra").is_none());
}

#[test]
fn expand_array_fans_out_one_record_per_element() {
    let mut mapping = measurement_mapping();
    mapping.substitutions = vec![
        serde_json::from_value(json!({"pathSource": "$.device", "pathTarget": "source.id"}))
            .unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.readings",
            "pathTarget": "c8y_Temperature.value",
            "expandArray": true
        }))
        .unwrap(),
    ];

    let result = execute(
        r#"{"device": "1234", "readings": [20.0, 21.0, 22.0]}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();

    assert_eq!(result.errors, Vec::<String>::new());
    assert_eq!(result.payloads.len(), 3);
    for (payload, expected) in result.payloads.iter().zip([20.0, 21.0, 22.0]) {
        // the identifier written before the fan-out is broadcast to every record
        assert_eq!(payload["source"]["id"], json!("1234"));
        assert_eq!(payload["c8y_Temperature"]["value"], json!(expected));
        assert!(payload["time"].as_str().is_some());
    }
}

#[test]
fn fan_out_cardinality_mismatch_is_reported() {
    let mut mapping = measurement_mapping();
    mapping.substitutions = vec![
        serde_json::from_value(json!({"pathSource": "$.id", "pathTarget": "source.id"})).unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.values",
            "pathTarget": "value",
            "expandArray": true
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "pathSource": "$.texts",
            "pathTarget": "text",
            "expandArray": true
        }))
        .unwrap(),
    ];

    let result = execute(
        r#"{"id": "1", "values": [1, 2, 3], "texts": ["a", "b"]}"#,
        &mapping,
        &ExecutionConfig::default(),
    )
    .unwrap();

    assert_eq!(result.payloads.len(), 3);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("$.texts"));
    // the shorter list still fills as many records as it covers
    assert_eq!(result.payloads[0]["text"], json!("a"));
    assert_eq!(result.payloads[1]["text"], json!("b"));
    assert!(result.payloads[2].get("text").is_none());
}

#[test]
fn simulate_overwrites_identifier_and_time() {
    let mapping = measurement_mapping();
    let config = ExecutionConfig {
        simulate: true,
        test_device_id: "424242".to_string(),
    };
    let result = execute(r#"{"id": "1234", "temp": 21.5}"#, &mapping, &config).unwrap();
    let payload = result.payload();
    assert_eq!(payload["source"]["id"], json!("424242"));
    assert!(payload["time"].as_str().is_some());
}

#[test]
fn simulate_leaves_inventory_identity_alone() {
    let mapping: Mapping = serde_json::from_value(json!({
        "id": "m2",
        "targetAPI": "INVENTORY",
        "subscriptionTopic": "registry/#",
        "templateTopic": "registry/+",
        "templateTopicSample": "registry/110",
        "source": "{}",
        "target": "{}",
        "substitutions": [
            {"pathSource": "$.name", "pathTarget": "name"}
        ]
    }))
    .unwrap();

    let config = ExecutionConfig {
        simulate: true,
        test_device_id: "424242".to_string(),
    };
    let result = execute(r#"{"name": "pump-7"}"#, &mapping, &config).unwrap();
    let payload = result.payload();
    assert_eq!(payload["name"], json!("pump-7"));
    assert!(payload.get("_DEVICE_IDENT_").is_none());
}

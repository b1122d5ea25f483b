//! Editable template expansion and reduction.
//!
//! The editor works on templates enriched with synthetic sidecar fields: the
//! decomposed topic levels on the external side and a device-identifier
//! sentinel on the INVENTORY side. Both are engine-internal and are stripped
//! again before a template is persisted.

use serde_json::{Value as JsonValue, json};

use crate::model::{SAMPLE_DEVICE_IDENT, TOKEN_DEVICE_IDENT, TOKEN_TOPIC_LEVEL, TargetApi};

/// Add the topic-level sequence to an external (broker-side) template so the
/// editor can offer per-level substitution targets. Arrays cannot carry a
/// sidecar field and pass through unchanged.
pub fn expand_external_template(payload: JsonValue, levels: &[String]) -> JsonValue {
    match payload {
        JsonValue::Object(mut map) => {
            map.insert(TOKEN_TOPIC_LEVEL.to_string(), json!(levels));
            JsonValue::Object(map)
        }
        other => other,
    }
}

/// Add the synthetic device-identifier placeholder to an API-side template.
/// Only INVENTORY payloads carry it; every other kind passes through.
pub fn expand_c8y_template(payload: JsonValue, target_api: TargetApi) -> JsonValue {
    match (target_api, payload) {
        (TargetApi::Inventory, JsonValue::Object(mut map)) => {
            map.insert(TOKEN_DEVICE_IDENT.to_string(), json!(SAMPLE_DEVICE_IDENT));
            JsonValue::Object(map)
        }
        (_, other) => other,
    }
}

/// Serialize a template for persistence, stripping the synthetic fields.
/// `keep_synthetic` keeps them for transient "patched" test runs only.
pub fn reduce_template(payload: &JsonValue, keep_synthetic: bool) -> String {
    if keep_synthetic {
        return payload.to_string();
    }
    let mut reduced = payload.clone();
    if let Some(map) = reduced.as_object_mut() {
        map.remove(TOKEN_TOPIC_LEVEL);
        map.remove(TOKEN_DEVICE_IDENT);
    }
    reduced.to_string()
}

//! Transformation executor: applies a mapping's substitution set to a
//! concrete source payload.
//!
//! Each call is a pure function of its inputs; the mapping snapshot is
//! read-only for the duration of one call, so hosts may execute many
//! mappings and messages concurrently. A single unmatched path never aborts
//! the run: it becomes one entry in the result's error list. Only a
//! malformed payload, an unrecognized target API kind or an unparseable
//! path expression fails the whole call.

use chrono::{SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{TransformError, TransformErrorKind};
use crate::model::{Mapping, MappingSubstitution, RepairStrategy, TIME, TargetApi};
use crate::path::{PathToken, evaluate, parse_path, remove_path, set_path};

/// Per-call configuration. The test device identifier is an explicit input
/// here, not process-wide state.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub simulate: bool,
    pub test_device_id: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            test_device_id: crate::model::SAMPLE_DEVICE_IDENT.to_string(),
        }
    }
}

/// Result of one execution: produced target record(s) plus the non-fatal
/// errors collected along the way, each referencing the offending path.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Exactly one record unless a substitution with `expand_array` fanned a
    /// multi-valued match out into one record per element.
    pub payloads: Vec<JsonValue>,
    pub errors: Vec<String>,
}

impl TransformResult {
    /// The primary (first) target record.
    pub fn payload(&self) -> &JsonValue {
        &self.payloads[0]
    }
}

/// Apply `mapping`'s substitutions to `source_payload`.
pub fn execute(
    source_payload: &str,
    mapping: &Mapping,
    config: &ExecutionConfig,
) -> Result<TransformResult, TransformError> {
    let source: JsonValue = serde_json::from_str(source_payload).map_err(|err| {
        TransformError::new(
            TransformErrorKind::MalformedSourcePayload,
            format!("source payload is not valid JSON: {}", err),
        )
    })?;

    let identifier = mapping.target_api.identifier().ok_or_else(|| {
        TransformError::new(
            TransformErrorKind::UnsupportedTargetKind,
            "mapping has an unrecognized target API kind",
        )
    })?;

    let mut records: Vec<JsonValue> = vec![JsonValue::Object(serde_json::Map::new())];
    let mut errors: Vec<String> = Vec::new();
    let mut time_substituted = false;

    for substitution in &mapping.substitutions {
        debug!(
            path_source = %substitution.path_source,
            path_target = %substitution.path_target,
            "applying substitution"
        );
        let target_tokens = parse_path(&substitution.path_target)
            .map_err(|err| TransformError::from(err).with_path(substitution.path_target.clone()))?;

        if substitution.path_target == TIME {
            time_substituted = true;
        }

        let value = match evaluate(&source, &substitution.path_source) {
            Ok(value) => value,
            Err(err) if err.kind == TransformErrorKind::EvaluationError => {
                errors.push(err.to_string());
                continue;
            }
            Err(err) => return Err(err),
        };

        if substitution.defines_device_identifier(mapping.target_api, mapping.direction) {
            match value {
                Some(value) => write_all(&mut records, &target_tokens, value),
                None => errors.push(format!(
                    "no result evaluating source path '{}'; device identifier '{}' not set",
                    substitution.path_source, substitution.path_target
                )),
            }
            continue;
        }

        apply_substitution(substitution, value, &target_tokens, &mut records, &mut errors);
    }

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    if config.simulate && mapping.target_api != TargetApi::Inventory {
        let identifier_tokens =
            parse_path(identifier).map_err(|err| TransformError::from(err).with_path(identifier))?;
        write_all(
            &mut records,
            &identifier_tokens,
            JsonValue::String(config.test_device_id.clone()),
        );
        write_all(
            &mut records,
            &[PathToken::Key(TIME.to_string())],
            JsonValue::String(now.clone()),
        );
    }

    // every produced record carries a timestamp even when the mapping
    // defines none
    if !time_substituted {
        write_all(
            &mut records,
            &[PathToken::Key(TIME.to_string())],
            JsonValue::String(now),
        );
    }

    Ok(TransformResult {
        payloads: records,
        errors,
    })
}

fn apply_substitution(
    substitution: &MappingSubstitution,
    value: Option<JsonValue>,
    target_tokens: &[PathToken],
    records: &mut Vec<JsonValue>,
    errors: &mut Vec<String>,
) {
    match value {
        None => match substitution.repair_strategy {
            RepairStrategy::Ignore => {}
            RepairStrategy::RemoveIfMissing => {
                for record in records.iter_mut() {
                    remove_path(record, target_tokens);
                }
            }
            _ => errors.push(format!(
                "no result evaluating source path '{}'; target '{}' not written",
                substitution.path_source, substitution.path_target
            )),
        },
        Some(JsonValue::Array(items)) => {
            if substitution.expand_array {
                fan_out(substitution, items, target_tokens, records, errors);
                return;
            }
            match substitution.repair_strategy {
                RepairStrategy::UseFirstValueOfArray => match items.first() {
                    Some(first) => write_all(records, target_tokens, first.clone()),
                    None => errors.push(format!(
                        "empty array evaluating source path '{}'; target '{}' not written",
                        substitution.path_source, substitution.path_target
                    )),
                },
                RepairStrategy::UseLastValueOfArray => match items.last() {
                    Some(last) => write_all(records, target_tokens, last.clone()),
                    None => errors.push(format!(
                        "empty array evaluating source path '{}'; target '{}' not written",
                        substitution.path_source, substitution.path_target
                    )),
                },
                RepairStrategy::Ignore => {}
                _ => write_all(records, target_tokens, JsonValue::Array(items)),
            }
        }
        Some(value) => write_all(records, target_tokens, value),
    }
}

/// Fan a multi-valued match out into one target record per element. Scalar
/// substitutions applied before or after are broadcast to every record.
fn fan_out(
    substitution: &MappingSubstitution,
    items: Vec<JsonValue>,
    target_tokens: &[PathToken],
    records: &mut Vec<JsonValue>,
    errors: &mut Vec<String>,
) {
    if records.len() == 1 && items.len() > 1 {
        let seed = records[0].clone();
        records.resize(items.len(), seed);
    } else if records.len() != items.len() {
        errors.push(format!(
            "source path '{}' produced {} values but {} target records exist; extra values dropped",
            substitution.path_source,
            items.len(),
            records.len()
        ));
    }
    for (record, item) in records.iter_mut().zip(items.into_iter()) {
        set_path(record, target_tokens, item);
    }
}

fn write_all(records: &mut [JsonValue], target_tokens: &[PathToken], value: JsonValue) {
    if let Some((last, rest)) = records.split_last_mut() {
        for record in rest {
            set_path(record, target_tokens, value.clone());
        }
        set_path(last, target_tokens, value);
    }
}

//! Snoop capture lifecycle.
//!
//! Per mapping: NONE → ENABLED (operator requests capture) → STARTED (the
//! capture collaborator appended the first sample) → STOPPED (operator
//! halted capture; samples become usable as source templates). The engine
//! only drives the transitions; appending runs in an external collaborator.

use serde_json::{Value as JsonValue, json};

use crate::error::SnoopError;
use crate::model::{Mapping, SnoopStatus};
use crate::template::reduce_template;

/// Request capture to begin. Valid from `NONE` or `STOPPED`.
pub fn start_snoop(mapping: &mut Mapping) -> Result<(), SnoopError> {
    match mapping.snoop_status {
        SnoopStatus::None | SnoopStatus::Stopped => {
            mapping.snoop_status = SnoopStatus::Enabled;
            Ok(())
        }
        from => Err(SnoopError::InvalidTransition {
            from,
            action: "start snooping",
        }),
    }
}

/// Append one captured raw payload. Called by the capture collaborator; the
/// first sample moves the mapping to `STARTED`.
pub fn record_snooped_payload(mapping: &mut Mapping, payload: String) -> Result<(), SnoopError> {
    match mapping.snoop_status {
        SnoopStatus::Enabled | SnoopStatus::Started => {
            mapping.snooped_templates.push(payload);
            mapping.snoop_status = SnoopStatus::Started;
            Ok(())
        }
        from => Err(SnoopError::InvalidTransition {
            from,
            action: "record a snooped payload",
        }),
    }
}

/// Halt capture. Valid only from `STARTED`.
pub fn stop_snoop(mapping: &mut Mapping) -> Result<(), SnoopError> {
    match mapping.snoop_status {
        SnoopStatus::Started => {
            mapping.snoop_status = SnoopStatus::Stopped;
            Ok(())
        }
        from => Err(SnoopError::InvalidTransition {
            from,
            action: "stop snooping",
        }),
    }
}

/// Adopt a captured sample as the mapping's source template. Permitted only
/// when capture is `STOPPED` and samples exist; the state stays `STOPPED`.
///
/// Samples that are not valid JSON are wrapped as `{"message": <raw>}`
/// rather than rejected.
pub fn adopt_snooped_template(
    mapping: &mut Mapping,
    index: usize,
) -> Result<JsonValue, SnoopError> {
    if mapping.snoop_status != SnoopStatus::Stopped {
        return Err(SnoopError::InvalidTransition {
            from: mapping.snoop_status,
            action: "adopt a snooped template",
        });
    }
    if mapping.snooped_templates.is_empty() {
        return Err(SnoopError::NoSnoopedTemplates);
    }
    let raw = mapping
        .snooped_templates
        .get(index)
        .ok_or(SnoopError::SampleIndexOutOfRange {
            index,
            len: mapping.snooped_templates.len(),
        })?;

    let template = match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => value,
        Err(_) => json!({ "message": raw }),
    };
    mapping.source = reduce_template(&template, false);
    mapping.snoop_status = SnoopStatus::Stopped;
    Ok(template)
}

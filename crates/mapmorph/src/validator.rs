//! Mapping-level validation pass.
//!
//! Every check runs independently and the full set of violations is
//! returned; nothing short-circuits on the first failure. A mapping with a
//! non-empty result can still be saved, but hosts must treat it as not
//! activatable.

use regex::Regex;
use tracing::debug;

use crate::error::ValidationError;
use crate::model::{Direction, Mapping};
use crate::topic::{
    TOPIC_WILDCARD_MULTI, TOPIC_WILDCARD_SINGLE, same_topic_structure,
    split_topic_including_separator,
};

struct ValidationCtx {
    errors: Vec<ValidationError>,
}

impl ValidationCtx {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn push(&mut self, code: ValidationError) {
        if !self.errors.contains(&code) {
            self.errors.push(code);
        }
    }

    fn extend(&mut self, codes: Vec<ValidationError>) {
        for code in codes {
            self.push(code);
        }
    }

    fn finish(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Run the full validation pass for one mapping against the collection it
/// belongs to. An empty result means the mapping is structurally valid.
pub fn validate_mapping(mapping: &Mapping, all_mappings: &[Mapping]) -> Vec<ValidationError> {
    let mut ctx = ValidationCtx::new();

    ctx.extend(validate_substitutions(mapping));

    match mapping.direction {
        Direction::Inbound => {
            ctx.extend(validate_subscription_topic(&mapping.subscription_topic));
            ctx.extend(validate_template_topic(&mapping.template_topic));
            ctx.extend(validate_topic_coverage(
                &mapping.subscription_topic,
                &mapping.template_topic,
            ));
            ctx.extend(validate_topic_sample_alignment(
                &mapping.template_topic,
                &mapping.template_topic_sample,
            ));
        }
        Direction::Outbound => {
            let publish_topic = mapping.broker_topic();
            ctx.extend(validate_subscription_topic(publish_topic));
            ctx.extend(validate_topic_sample_alignment(
                publish_topic,
                &mapping.template_topic_sample,
            ));
        }
    }

    ctx.extend(validate_template_topic_unique(mapping, all_mappings));
    ctx.extend(validate_json_templates(mapping));

    ctx.finish()
}

/// Exactly one substitution may define the device identifier. The rule is
/// suspended while the mapping is snooping (no substitutions exist yet), for
/// opaque mapping types and for outbound mappings; a missing identifier is
/// tolerated when device creation is delegated.
pub fn validate_substitutions(mapping: &Mapping) -> Vec<ValidationError> {
    let mut result = Vec::new();
    let snooping = matches!(
        mapping.snoop_status,
        crate::model::SnoopStatus::Enabled | crate::model::SnoopStatus::Started
    );
    if snooping || mapping.mapping_type.is_opaque() || mapping.direction == Direction::Outbound {
        return result;
    }

    let count = mapping.count_device_identifiers();
    if count > 1 {
        result.push(ValidationError::OnlyOneSubstitutionDefiningDeviceIdentifierCanBeUsed);
    }
    if count < 1 && !mapping.create_non_existing_device {
        result.push(ValidationError::OneSubstitutionDefiningDeviceIdentifierMustBeUsed);
    }
    result
}

/// Wildcard grammar for a broker-facing topic: at most one multi-level
/// wildcard, and only as the final level. Single-level wildcards are free.
pub fn validate_subscription_topic(topic: &str) -> Vec<ValidationError> {
    let mut result = Vec::new();
    let multi_count = topic.matches(TOPIC_WILDCARD_MULTI).count();
    if multi_count > 1 {
        result.push(ValidationError::OnlyOneMultiLevelWildcard);
    }
    if multi_count >= 1 && topic.find(TOPIC_WILDCARD_MULTI) != Some(topic.len() - 1) {
        result.push(ValidationError::MultiLevelWildcardOnlyAtEnd);
    }
    result
}

/// A template topic is a routing key with a fixed level count, so it may
/// carry single-level wildcards but never a multi-level one.
pub fn validate_template_topic(topic: &str) -> Vec<ValidationError> {
    let mut result = Vec::new();
    if topic.contains(TOPIC_WILDCARD_MULTI) {
        result.push(ValidationError::NoMultiLevelWildcardAllowedInTemplateTopic);
    }
    result
}

/// The template topic must be covered by the subscription topic pattern.
///
/// The subscription topic is compiled into a regex: single-level wildcards
/// become `[^/]+`, the multi-level wildcard becomes `.*`. A trailing NUL is
/// appended to both sides so a final `+` cannot be swallowed by the match.
pub fn validate_topic_coverage(
    subscription_topic: &str,
    template_topic: &str,
) -> Vec<ValidationError> {
    let mut result = Vec::new();
    let st = format!("{}\u{0}", subscription_topic);
    let tt = format!("{}\u{0}", template_topic);

    let pattern = st
        .split(TOPIC_WILDCARD_SINGLE)
        .map(|part| regex::escape(part))
        .collect::<Vec<_>>()
        .join("[^/]+")
        .replace(&regex::escape(TOPIC_WILDCARD_MULTI), ".*");
    debug!(subscription = subscription_topic, template = template_topic, %pattern, "topic coverage test");

    let covered = Regex::new(&format!("^{}$", pattern))
        .map(|re| re.is_match(&tt))
        .unwrap_or(false);
    if !covered {
        result.push(ValidationError::TemplateTopicMustMatchTheSubscriptionTopic);
    }
    result
}

/// The sample must have the same number of levels as the template topic and
/// the same separator/wildcard/literal structure level-by-level.
pub fn validate_topic_sample_alignment(
    template_topic: &str,
    template_topic_sample: &str,
) -> Vec<ValidationError> {
    let mut result = Vec::new();
    let template_levels = split_topic_including_separator(template_topic);
    let sample_levels = split_topic_including_separator(template_topic_sample);

    if template_levels.len() != sample_levels.len() {
        result.push(
            ValidationError::TemplateTopicAndTemplateTopicSampleDoNotHaveSameNumberOfLevelsInTopicName,
        );
        return result;
    }
    if !same_topic_structure(&template_levels, &sample_levels) {
        result.push(
            ValidationError::TemplateTopicAndTemplateTopicSampleDoNotHaveSameStructureInTopicName,
        );
    }
    result
}

/// Template topics route messages to mappings, so within one direction they
/// must be unique and no topic may be a strict prefix of another.
pub fn validate_template_topic_unique(
    mapping: &Mapping,
    all_mappings: &[Mapping],
) -> Vec<ValidationError> {
    let mut result = Vec::new();
    let own = mapping.template_topic.as_str();
    if own.is_empty() {
        return result;
    }
    for other in all_mappings {
        if other.id == mapping.id || other.direction != mapping.direction {
            continue;
        }
        let theirs = other.template_topic.as_str();
        if theirs == own {
            if !result.contains(&ValidationError::TemplateTopicNotUnique) {
                result.push(ValidationError::TemplateTopicNotUnique);
            }
        } else if !theirs.is_empty() && (theirs.starts_with(own) || own.starts_with(theirs)) {
            let code = ValidationError::TemplateTopicMustNotBeSubstringOfOtherTemplateTopic;
            if !result.contains(&code) {
                result.push(code);
            }
        }
    }
    result
}

/// Source and target templates must parse as JSON. The target check is
/// skipped for opaque mapping types whose payload bypasses the JSON path.
pub fn validate_json_templates(mapping: &Mapping) -> Vec<ValidationError> {
    let mut result = Vec::new();
    if serde_json::from_str::<serde_json::Value>(&mapping.source).is_err() {
        result.push(ValidationError::SourceTemplateMustBeValidJson);
    }
    if !mapping.mapping_type.is_opaque()
        && serde_json::from_str::<serde_json::Value>(&mapping.target).is_err()
    {
        result.push(ValidationError::TargetTemplateMustBeValidJson);
    }
    result
}

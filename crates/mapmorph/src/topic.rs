//! Topic string utilities: splitting, wildcard grammar and level alignment.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

pub const TOPIC_WILDCARD_SINGLE: &str = "+";
pub const TOPIC_WILDCARD_MULTI: &str = "#";

fn leading_trailing_slashes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(/{2,}$)|(^/{2,})").unwrap())
}

fn trailing_multi_slash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#/$").unwrap())
}

/// True iff the topic contains a wildcard level.
pub fn is_wildcard_topic(topic: &str) -> bool {
    topic.contains(TOPIC_WILDCARD_MULTI) || topic.contains(TOPIC_WILDCARD_SINGLE)
}

/// Reduce repeated leading/trailing separators to a single one and rewrite a
/// trailing `#/` to `#`.
pub fn normalize_topic(topic: &str) -> String {
    let nt = leading_trailing_slashes().replace_all(topic.trim(), "/");
    trailing_multi_slash().replace(&nt, "#").into_owned()
}

/// Topic levels without separator entries: `"/d1/e1/f1/"` → `["d1","e1","f1"]`.
pub fn split_topic_excluding_separator(topic: &str) -> Vec<String> {
    topic
        .trim_matches('/')
        .split('/')
        .filter(|level| !level.is_empty())
        .map(str::to_string)
        .collect()
}

/// Topic levels with separator entries interleaved:
/// `"///d1/e1/f1///"` → `["/","d1","/","e1","/","f1","/"]`.
///
/// This is the sequence used for structural comparison, so that a missing or
/// extra separator shows up as a structure difference.
pub fn split_topic_including_separator(topic: &str) -> Vec<String> {
    let normalized = normalize_topic(topic);
    let mut levels = Vec::new();
    for part in normalized.split('/') {
        if !part.is_empty() {
            levels.push("/".to_string());
            levels.push(part.to_string());
        }
    }
    if !levels.is_empty() {
        if !normalized.starts_with('/') {
            levels.remove(0);
        }
        if normalized.ends_with('/') {
            levels.push("/".to_string());
        }
    }
    levels
}

/// Derive a storable template topic from a concrete or wildcard topic.
///
/// The trailing multi-level wildcard is rewritten to the single-level
/// placeholder so the result has a fixed level structure. A `#` anywhere but
/// the final level is a validation failure, never a silent truncation.
pub fn derive_template_topic_from_topic(topic: &str) -> Result<String, ValidationError> {
    let normalized = normalize_topic(topic);
    if let Some(pos) = normalized.find(TOPIC_WILDCARD_MULTI) {
        if pos != normalized.len() - 1 {
            return Err(ValidationError::MultiLevelWildcardOnlyAtEnd);
        }
    }
    Ok(normalized.replacen(TOPIC_WILDCARD_MULTI, TOPIC_WILDCARD_SINGLE, 1))
}

fn is_wildcard_level(level: &str) -> bool {
    level == TOPIC_WILDCARD_SINGLE || level == TOPIC_WILDCARD_MULTI
}

/// True iff both level sequences have equal length and agree level-by-level:
/// separators align with separators, wildcard levels in the template match
/// any sample level, and literal levels must be identical.
pub fn same_topic_structure(template_levels: &[String], sample_levels: &[String]) -> bool {
    if template_levels.len() != sample_levels.len() {
        return false;
    }
    template_levels
        .iter()
        .zip(sample_levels.iter())
        .all(|(t, s)| {
            if t == "/" || s == "/" {
                t == s
            } else {
                is_wildcard_level(t) || t == s
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn normalizes_topics() {
        assert_eq!(normalize_topic("/rom/hamburg/madrid/#/"), "/rom/hamburg/madrid/#");
        assert_eq!(normalize_topic("///rom/hamburg/madrid/+//"), "/rom/hamburg/madrid/+/");
    }

    #[test]
    fn splits_excluding_separator() {
        assert_eq!(split_topic_excluding_separator("/d1/e1/f1/"), levels(&["d1", "e1", "f1"]));
        assert_eq!(split_topic_excluding_separator("///d1/e1/f1///"), levels(&["d1", "e1", "f1"]));
    }

    #[test]
    fn splits_including_separator() {
        assert_eq!(
            split_topic_including_separator("///d1/e1/f1///"),
            levels(&["/", "d1", "/", "e1", "/", "f1", "/"])
        );
        assert_eq!(
            split_topic_including_separator("d1/e1"),
            levels(&["d1", "/", "e1"])
        );
    }

    #[test]
    fn detects_wildcards() {
        assert!(is_wildcard_topic("device/+/data"));
        assert!(is_wildcard_topic("device/#"));
        assert!(!is_wildcard_topic("device/1/data"));
    }

    #[test]
    fn derives_template_topic() {
        assert_eq!(derive_template_topic_from_topic("device/#").unwrap(), "device/+");
        assert_eq!(derive_template_topic_from_topic("device/+/data").unwrap(), "device/+/data");
        assert_eq!(derive_template_topic_from_topic("/plant/#/").unwrap(), "/plant/+");
        assert_eq!(
            derive_template_topic_from_topic("device/#/data").unwrap_err(),
            ValidationError::MultiLevelWildcardOnlyAtEnd
        );
    }

    #[test]
    fn derived_topic_keeps_the_source_structure() {
        for topic in ["device/#", "device/+/data", "plant/line/machine"] {
            let derived = derive_template_topic_from_topic(topic).unwrap();
            assert!(same_topic_structure(
                &split_topic_including_separator(topic),
                &split_topic_including_separator(&derived),
            ));
        }
    }

    #[test]
    fn compares_structures() {
        assert!(same_topic_structure(
            &split_topic_including_separator("/device/+/east/"),
            &split_topic_including_separator("/device/us/east/"),
        ));
        assert!(!same_topic_structure(
            &split_topic_including_separator("device/+/data"),
            &split_topic_including_separator("device/1/2/data"),
        ));
        assert!(!same_topic_structure(
            &split_topic_including_separator("/plant2/+/machine1"),
            &split_topic_including_separator("plant2/line1/machine1"),
        ));
    }
}

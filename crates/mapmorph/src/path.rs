//! Path expression parsing and evaluation over JSON values.
//!
//! Expressions are `$`-rooted dot/bracket paths (`$.device.values[0].temp`,
//! `payload['key with spaces']`). Evaluation distinguishes three outcomes:
//! a match, an explicit miss (`None`, for absent keys or out-of-range
//! indexes) and a typed failure when the expression is applied against an
//! incompatible document shape.

use serde_json::Value as JsonValue;

use crate::error::{PathError, TransformError, TransformErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    Key(String),
    Index(usize),
}

/// Shape classification of an evaluation result, so callers can decide on
/// array-expansion behavior without re-inspecting raw JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Empty,
    Scalar,
    Array,
    Object,
}

pub fn classify(value: Option<&JsonValue>) -> ResultKind {
    match value {
        None | Some(JsonValue::Null) => ResultKind::Empty,
        Some(JsonValue::Array(_)) => ResultKind::Array,
        Some(JsonValue::Object(_)) => ResultKind::Object,
        Some(_) => ResultKind::Scalar,
    }
}

/// Parse a path expression into tokens.
///
/// Grammar: optional leading `$`, `.`-separated keys, `[n]` indexes and
/// `['key']` / `["key"]` quoted keys. An empty expression is a parse error;
/// callers that treat empty as "no path" must check before parsing.
pub fn parse_path(expr: &str) -> Result<Vec<PathToken>, PathError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(PathError::new("path expression is empty"));
    }

    let mut rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
    rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.is_empty() {
        // bare "$" addresses the document root
        return Ok(Vec::new());
    }

    let mut tokens = Vec::new();
    let mut chars = rest.char_indices().peekable();
    let mut key_start: Option<usize> = None;

    let flush_key = |tokens: &mut Vec<PathToken>,
                     start: &mut Option<usize>,
                     end: usize|
     -> Result<(), PathError> {
        if let Some(s) = start.take() {
            let key = &rest[s..end];
            if key.is_empty() {
                return Err(PathError::new(format!("empty segment in '{}'", expr)));
            }
            tokens.push(PathToken::Key(key.to_string()));
        }
        Ok(())
    };

    while let Some((i, c)) = chars.next() {
        match c {
            '.' => {
                flush_key(&mut tokens, &mut key_start, i)?;
                match chars.peek() {
                    Some((_, '.')) | Some((_, '[')) | None => {
                        return Err(PathError::new(format!("empty segment in '{}'", expr)));
                    }
                    _ => {}
                }
            }
            '[' => {
                flush_key(&mut tokens, &mut key_start, i)?;
                let mut inner = String::new();
                let mut closed = false;
                for (_, b) in chars.by_ref() {
                    if b == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(b);
                }
                if !closed {
                    return Err(PathError::new(format!("unclosed bracket in '{}'", expr)));
                }
                let inner = inner.trim();
                if (inner.starts_with('\'') && inner.ends_with('\'') && inner.len() >= 2)
                    || (inner.starts_with('"') && inner.ends_with('"') && inner.len() >= 2)
                {
                    tokens.push(PathToken::Key(inner[1..inner.len() - 1].to_string()));
                } else {
                    let index: usize = inner.parse().map_err(|_| {
                        PathError::new(format!("invalid index '{}' in '{}'", inner, expr))
                    })?;
                    tokens.push(PathToken::Index(index));
                }
                // after a bracket the next segment starts with '.' or '['
                if let Some((_, next)) = chars.peek() {
                    if *next == '.' {
                        chars.next();
                        match chars.peek() {
                            Some((_, '.')) | Some((_, '[')) | None => {
                                return Err(PathError::new(format!(
                                    "empty segment in '{}'",
                                    expr
                                )));
                            }
                            _ => {}
                        }
                    } else if *next != '[' {
                        return Err(PathError::new(format!(
                            "expected '.' or '[' after bracket in '{}'",
                            expr
                        )));
                    }
                }
            }
            _ => {
                if key_start.is_none() {
                    key_start = Some(i);
                }
            }
        }
    }
    flush_key(&mut tokens, &mut key_start, rest.len())?;

    Ok(tokens)
}

/// Evaluate a path expression against a document.
///
/// An empty or blank expression is the explicit empty marker (`Ok(None)`),
/// never a parse attempt. Absent keys and out-of-range indexes yield
/// `Ok(None)`; keying into a scalar or array, or indexing into a non-array,
/// is an evaluation failure.
pub fn evaluate(document: &JsonValue, expr: &str) -> Result<Option<JsonValue>, TransformError> {
    if expr.trim().is_empty() {
        return Ok(None);
    }
    let tokens = parse_path(expr)?;
    let mut current: Option<&JsonValue> = Some(document);

    for token in &tokens {
        let Some(value) = current else {
            break;
        };
        match (token, value) {
            (PathToken::Key(_), JsonValue::Null) => current = None,
            (PathToken::Key(key), JsonValue::Object(map)) => current = map.get(key),
            (PathToken::Key(key), _) => {
                return Err(TransformError::new(
                    TransformErrorKind::EvaluationError,
                    format!("cannot select key '{}' from a non-object value", key),
                )
                .with_path(expr));
            }
            (PathToken::Index(_), JsonValue::Null) => current = None,
            (PathToken::Index(index), JsonValue::Array(items)) => current = items.get(*index),
            (PathToken::Index(index), _) => {
                return Err(TransformError::new(
                    TransformErrorKind::EvaluationError,
                    format!("cannot index [{}] into a non-array value", index),
                )
                .with_path(expr));
            }
        }
    }

    Ok(current.filter(|v| !v.is_null()).cloned())
}

/// Write `value` at `tokens`, creating intermediate containers as needed:
/// objects for key tokens, arrays (padded with null) for index tokens.
pub fn set_path(target: &mut JsonValue, tokens: &[PathToken], value: JsonValue) {
    let Some((first, rest)) = tokens.split_first() else {
        *target = value;
        return;
    };

    match first {
        PathToken::Key(key) => {
            if !target.is_object() {
                *target = JsonValue::Object(serde_json::Map::new());
            }
            let map = target.as_object_mut().unwrap();
            let slot = map.entry(key.clone()).or_insert(JsonValue::Null);
            set_path(slot, rest, value);
        }
        PathToken::Index(index) => {
            if !target.is_array() {
                *target = JsonValue::Array(Vec::new());
            }
            let items = target.as_array_mut().unwrap();
            while items.len() <= *index {
                items.push(JsonValue::Null);
            }
            set_path(&mut items[*index], rest, value);
        }
    }
}

/// Remove the field at `tokens` if present. Missing intermediate containers
/// are a no-op.
pub fn remove_path(target: &mut JsonValue, tokens: &[PathToken]) {
    let Some((last, parents)) = tokens.split_last() else {
        return;
    };

    let mut current = target;
    for token in parents {
        let next = match (token, current) {
            (PathToken::Key(key), JsonValue::Object(map)) => map.get_mut(key),
            (PathToken::Index(index), JsonValue::Array(items)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return,
        }
    }

    match (last, current) {
        (PathToken::Key(key), JsonValue::Object(map)) => {
            map.remove(key);
        }
        (PathToken::Index(index), JsonValue::Array(items)) => {
            if *index < items.len() {
                items.remove(*index);
            }
        }
        _ => {}
    }
}

// SPDX-License-Identifier: MIT

//! Reference resolution for step arguments
//!
//! Two forms are recognized inside string values:
//! - a whole-string reference, `"$steps.plan.pages"`, replaced by the
//!   referenced JSON value (any type)
//! - embedded placeholders, `"Score was ${steps.score.value}"`, replaced by
//!   the referenced value rendered as text
//!
//! A leading `$$` escapes a literal dollar sign; placeholders after it are
//! still filled.

use serde_json::Value;

use super::store::ProcessState;
use crate::sdk::error::DefinitionError;

/// A parsed reference path
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// `input.<rest>`
    Input(Vec<String>),
    /// `steps.<id>.<rest>`
    Step { id: String, rest: Vec<String> },
}

impl Reference {
    pub fn parse(path: &str) -> Result<Self, DefinitionError> {
        let invalid = || DefinitionError::InvalidReference(path.to_string());
        let mut parts = path.split('.');

        let root = parts.next().ok_or_else(invalid)?;
        let rest: Vec<String>;
        let reference = match root {
            "input" => {
                rest = parts.map(str::to_string).collect();
                Reference::Input(rest)
            }
            "steps" => {
                let id = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
                rest = parts.map(str::to_string).collect();
                Reference::Step {
                    id: id.to_string(),
                    rest,
                }
            }
            _ => return Err(invalid()),
        };

        let segments = match &reference {
            Reference::Input(r) | Reference::Step { rest: r, .. } => r,
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }
        Ok(reference)
    }

    /// Step id this reference depends on
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Reference::Input(_) => None,
            Reference::Step { id, .. } => Some(id),
        }
    }
}

fn whole_reference(s: &str) -> Option<&str> {
    let path = s.strip_prefix('$')?;
    if path.starts_with('$') || path.starts_with('{') || path.is_empty() {
        return None;
    }
    if path.chars().any(char::is_whitespace) {
        return None;
    }
    Some(path)
}

/// Split a string into literal text and `${...}` placeholder paths
fn placeholders(s: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                found.push(after[..end].trim());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    found
}

/// Collect every reference path used inside a value
pub fn collect_paths(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(path) = whole_reference(s) {
                out.push(path.to_string());
            } else {
                let text = s.strip_prefix("$$").unwrap_or(s);
                out.extend(placeholders(text).into_iter().map(str::to_string));
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_paths(v, out)),
        Value::Object(obj) => obj.values().for_each(|v| collect_paths(v, out)),
        _ => {}
    }
}

/// Paths used as `${...}` placeholders inside a plain string
pub fn template_paths(text: &str) -> Vec<String> {
    placeholders(text).into_iter().map(str::to_string).collect()
}

/// Resolve every reference inside `value` against the state.
///
/// Missing references resolve to `null` (or empty text inside a template)
/// and are logged.
pub fn resolve(value: &Value, state: &ProcessState) -> Value {
    match value {
        Value::String(s) => {
            if let Some(path) = whole_reference(s) {
                lookup(path, state)
            } else if let Some(escaped) = s.strip_prefix("$$") {
                Value::String(format!("${}", interpolate(escaped, state)))
            } else {
                Value::String(interpolate(s, state))
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, state)).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), resolve(v, state)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Replace `${...}` placeholders in a string
pub fn interpolate(text: &str, state: &ProcessState) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&value_to_text(&lookup(after[..end].trim(), state)));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup(path: &str, state: &ProcessState) -> Value {
    match state.get_path(path) {
        Some(v) => v.clone(),
        None => {
            log::warn!("Reference '{}' did not resolve", path);
            Value::Null
        }
    }
}

/// Render a JSON value as plain text
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Named server-entry templates with `{{VAR}}` placeholders.
//!
//! Templates live in `mcpset.templates.json`:
//!
//! ```json
//! { "templates": { "github": { "description": "...", "data": { "command": "npx", ... } } } }
//! ```

use crate::McpsetError;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Load all templates, keyed by name. A missing file yields no templates.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_templates(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read templates file: {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse templates file: {}", path.display()))?;

    Ok(document.get("templates").and_then(Value::as_object).cloned().unwrap_or_default())
}

/// Parse `VAR=VAL` assignments given on the command line.
///
/// # Errors
///
/// Returns an error if an assignment has no `=`.
pub fn parse_assignments(sets: &[String]) -> Result<HashMap<String, String>, McpsetError> {
    sets.iter()
        .map(|set| {
            set.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    McpsetError::Template(format!("--set must be of the form KEY=VAL: {set}"))
                })
        })
        .collect()
}

/// Render template `name` into a server entry.
///
/// Placeholders resolve from `sets` first, then the process environment; unresolved ones are
/// kept verbatim.
///
/// # Errors
///
/// Returns an error if the template does not exist or an assignment is malformed.
pub fn render_template(
    templates: &Map<String, Value>,
    name: &str,
    sets: &[String],
) -> Result<Value, McpsetError> {
    let template = templates
        .get(name)
        .ok_or_else(|| McpsetError::Template(format!("template not found: {name}")))?;
    let variables = parse_assignments(sets)?;
    let data = template.get("data").cloned().unwrap_or_else(|| Value::Object(Map::new()));

    substitute(&data, &|key: &str| variables.get(key).cloned().or_else(|| std::env::var(key).ok()))
}

/// Replace `{{VAR}}` placeholders in every string of `value` using `lookup`.
///
/// # Errors
///
/// Returns an error if the placeholder pattern cannot be compiled.
pub fn substitute(
    value: &Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Value, McpsetError> {
    let pattern = Regex::new(r"\{\{([^{}]+)\}\}")
        .map_err(|e| McpsetError::Template(format!("invalid placeholder pattern: {e}")))?;
    Ok(substitute_with(value, &pattern, lookup))
}

fn substitute_with(
    value: &Value,
    pattern: &Regex,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Value {
    match value {
        Value::String(s) => Value::String(
            pattern
                .replace_all(s, |caps: &Captures<'_>| {
                    lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| substitute_with(item, pattern, lookup)).collect())
        },
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), substitute_with(field, pattern, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

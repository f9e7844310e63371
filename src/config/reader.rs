use crate::target::{Target, TargetFormat};
use crate::{McpsetError, ServerMap};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read a JSON document whose top level must be an object.
///
/// Returns `None` if the file does not exist; an empty or whitespace-only file reads as an
/// empty object.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to read the file (when it exists)
/// - Unable to parse the JSON content
/// - The top-level value is not an object
pub fn read_json_document<P: AsRef<Path>>(path: P) -> Result<Option<Map<String, Value>>, McpsetError> {
    let path_ref = path.as_ref();

    let Some(content) = read_optional(path_ref)? else {
        return Ok(None);
    };

    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }

    let document: Value = serde_json::from_str(&content).map_err(|e| parse_error(path_ref, &e))?;

    match document {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(McpsetError::Parse {
            path: path_ref.display().to_string(),
            message: "top-level value is not an object".to_string(),
        }),
    }
}

/// Read a TOML document into plain tree form.
///
/// Returns `None` if the file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to read the file (when it exists)
/// - Unable to parse the TOML content
pub fn read_toml_document<P: AsRef<Path>>(path: P) -> Result<Option<Map<String, Value>>, McpsetError> {
    let path_ref = path.as_ref();

    let Some(content) = read_optional(path_ref)? else {
        return Ok(None);
    };

    parse_toml_document(&content).map(Some).map_err(|e| parse_error(path_ref, &e))
}

/// Parse TOML text into plain tree form.
///
/// # Errors
///
/// Returns an error if the TOML content is invalid.
pub fn parse_toml_document(content: &str) -> Result<Map<String, Value>, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(table.iter().map(|(key, value)| (key.clone(), toml_to_tree(value))).collect())
}

/// Read a target's server map from under its root key.
///
/// Missing files, missing root keys and root keys that do not hold a mapping all read as an
/// empty map.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_server_map(target: &Target) -> Result<ServerMap, McpsetError> {
    let document = match target.format() {
        TargetFormat::Json => read_json_document(target.path())?,
        TargetFormat::Toml => read_toml_document(target.path())?,
    };

    let Some(document) = document else {
        debug!("{}: {} does not exist", target.name(), target.path().display());
        return Ok(ServerMap::new());
    };

    Ok(extract_server_map(target, &document))
}

/// Pull the server map out of an already parsed document.
pub fn extract_server_map(target: &Target, document: &Map<String, Value>) -> ServerMap {
    match document.get(target.root_key()) {
        Some(Value::Object(servers)) => servers.clone(),
        Some(other) => {
            warn!(
                "{}: '{}' in {} is not a mapping ({}); treating it as empty",
                target.name(),
                target.root_key(),
                target.path().display(),
                kind_of(other)
            );
            ServerMap::new()
        },
        None => ServerMap::new(),
    }
}

/// Convert a TOML value into a configuration tree.
///
/// Datetimes become strings; non-finite floats have no JSON form and become null.
pub fn toml_to_tree(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(Number::from(*i)),
        toml::Value::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_tree).collect()),
        toml::Value::Table(table) => Value::Object(
            table.iter().map(|(key, value)| (key.clone(), toml_to_tree(value))).collect(),
        ),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, McpsetError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(McpsetError::Io(e)),
    }
}

fn parse_error(path: &Path, error: &dyn std::fmt::Display) -> McpsetError {
    McpsetError::Parse { path: path.display().to_string(), message: error.to_string() }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

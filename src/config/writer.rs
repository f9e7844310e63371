use super::reader::{parse_toml_document, read_json_document};
use crate::target::{Target, TargetFormat};
use crate::{McpsetError, ServerMap};
use chrono::Local;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use toml_edit::{Array, DocumentMut, InlineTable, Item, Table, TableLike};

/// Write a target's server map back under its root key.
///
/// Everything else in the file is kept. A missing file is created along with its parent
/// directories.
///
/// # Errors
///
/// Returns an error if:
/// - The existing file cannot be read or parsed
/// - Unable to serialize the document
/// - Unable to write the file
pub fn write_server_map(target: &Target, servers: &ServerMap) -> Result<(), McpsetError> {
    match target.format() {
        TargetFormat::Json => write_json_server_map(target.path(), target.root_key(), servers),
        TargetFormat::Toml => write_toml_server_map(target.path(), target.root_key(), servers),
    }
}

fn write_json_server_map(
    path: &Path,
    root_key: &str,
    servers: &ServerMap,
) -> Result<(), McpsetError> {
    let mut document = read_json_document(path)?.unwrap_or_default();
    document.insert(root_key.to_string(), Value::Object(servers.clone()));

    write_json_pretty(path, &Value::Object(document))
}

fn write_toml_server_map(
    path: &Path,
    root_key: &str,
    servers: &ServerMap,
) -> Result<(), McpsetError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(McpsetError::Io(e)),
    };

    let rendered = render_toml_server_map(&content, root_key, servers).map_err(|e| match e {
        McpsetError::Toml(inner) => {
            McpsetError::Parse { path: path.display().to_string(), message: inner.to_string() }
        },
        McpsetError::TomlEdit(inner) => {
            McpsetError::Parse { path: path.display().to_string(), message: inner.to_string() }
        },
        other => other,
    })?;

    atomic_write(path, rendered.as_bytes())
}

/// Replace the server table of a TOML document, keeping untouched content as written.
///
/// Changed entries are edited in place: keys whose value did not change keep their original
/// item (comments, datetimes, `nan` and all), appended list items are pushed onto the existing
/// array, and only keys that were added or changed are rendered. New entries become
/// `[root.name]` tables; entries absent from `servers` are removed.
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML.
pub fn render_toml_server_map(
    content: &str,
    root_key: &str,
    servers: &ServerMap,
) -> Result<String, McpsetError> {
    let mut document: DocumentMut = content.parse()?;
    let previous = parse_toml_document(content)?
        .get(root_key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if !document.get(root_key).is_some_and(Item::is_table_like) {
        let mut table = Table::new();
        table.set_implicit(true);
        document.insert(root_key, Item::Table(table));
    }
    let inline_root = document.get(root_key).is_some_and(Item::is_inline_table);

    let root = document.get_mut(root_key).and_then(Item::as_table_like_mut).ok_or_else(|| {
        McpsetError::InvalidTarget(format!("'{root_key}' could not be created as a TOML table"))
    })?;

    let stale: Vec<String> = root
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !servers.contains_key(key))
        .collect();
    for key in stale {
        root.remove(&key);
    }

    for (name, entry) in servers {
        if let Some(before) = previous.get(name) {
            if let Some(item) = root.get_mut(name) {
                if !update_item(item, before, entry) {
                    root.remove(name);
                }
                continue;
            }
        }

        let fresh = if inline_root {
            tree_to_toml_value(entry).map(Item::Value)
        } else {
            tree_to_item(entry)
        };
        match fresh {
            Some(item) => {
                root.insert(name, item);
            },
            None => {
                root.remove(name);
            },
        }
    }

    Ok(document.to_string())
}

/// Drop what a TOML file cannot hold from servers about to be merged into one.
///
/// Nulls are removed from mappings and lists, and integers outside the `i64` range become
/// floats, so that what is merged in matches what reads back after the write.
#[must_use]
pub fn toml_representable(servers: &ServerMap) -> ServerMap {
    servers
        .iter()
        .filter_map(|(name, entry)| representable(entry).map(|entry| (name.clone(), entry)))
        .collect()
}

fn representable(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Number(n) if n.as_i64().is_none() => {
            n.as_f64().and_then(serde_json::Number::from_f64).map(Value::Number)
        },
        Value::Array(items) => Some(Value::Array(items.iter().filter_map(representable).collect())),
        Value::Object(fields) => Some(Value::Object(
            fields
                .iter()
                .filter_map(|(key, field)| representable(field).map(|field| (key.clone(), field)))
                .collect(),
        )),
        other => Some(other.clone()),
    }
}

/// Bring `item` from `before` to `after`, touching only what differs.
///
/// Returns `false` when `after` has no TOML form and the key should be removed.
fn update_item(item: &mut Item, before: &Value, after: &Value) -> bool {
    if before == after {
        return true;
    }

    if let (Value::Object(old), Value::Object(new)) = (before, after) {
        if let Some(table) = item.as_table_like_mut() {
            update_table(table, old, new);
            return true;
        }
    }

    if let (Value::Array(old), Value::Array(new)) = (before, after) {
        if new.starts_with(old) {
            if let Some(array) = item.as_array_mut() {
                for added in new[old.len()..].iter().filter_map(tree_to_toml_value) {
                    array.push(added);
                }
                return true;
            }
        }
    }

    let Some(mut value) = tree_to_toml_value(after) else {
        return false;
    };
    if let Some(current) = item.as_value() {
        *value.decor_mut() = current.decor().clone();
    }
    *item = Item::Value(value);
    true
}

fn update_table(table: &mut dyn TableLike, before: &Map<String, Value>, after: &Map<String, Value>) {
    let dropped: Vec<String> = table
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !after.contains_key(key))
        .collect();
    for key in dropped {
        table.remove(&key);
    }

    for (key, new) in after {
        if let Some(old) = before.get(key) {
            if let Some(item) = table.get_mut(key) {
                if !update_item(item, old, new) {
                    table.remove(key);
                }
                continue;
            }
        }

        match tree_to_toml_value(new) {
            Some(value) => {
                table.insert(key, Item::Value(value));
            },
            None => {
                table.remove(key);
            },
        }
    }
}

/// Serialize a value as pretty JSON with a trailing newline and write it atomically.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_pretty(path: &Path, value: &Value) -> Result<(), McpsetError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    atomic_write(path, json.as_bytes())
}

/// Write `content` to `path` via a temporary file in the same directory.
///
/// The temporary file is renamed over `path` only after it has been fully written and synced;
/// on any failure it is removed when dropped.
///
/// # Errors
///
/// Returns an error if:
/// - Unable to create parent directories
/// - Unable to create, write or sync the temporary file
/// - Unable to rename the temporary file into place
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), McpsetError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp_file = NamedTempFile::new_in(&parent)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| McpsetError::Io(e.error))?;

    Ok(())
}

/// Create a backup of a file with timestamp
///
/// # Errors
///
/// Returns an error if unable to copy the file
pub fn backup_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<PathBuf>> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Ok(None);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = path_ref.with_file_name(format!(
        "{}.backup.{}",
        path_ref.file_name().and_then(|n| n.to_str()).unwrap_or("config"),
        timestamp
    ));

    fs::copy(path_ref, &backup_path)?;

    Ok(Some(backup_path))
}

fn tree_to_item(value: &Value) -> Option<Item> {
    match value {
        Value::Object(fields) => {
            let mut table = Table::new();
            for (key, field) in fields {
                if let Some(field_value) = tree_to_toml_value(field) {
                    table.insert(key, toml_edit::value(field_value));
                }
            }
            Some(Item::Table(table))
        },
        other => tree_to_toml_value(other).map(Item::Value),
    }
}

fn tree_to_toml_value(value: &Value) -> Option<toml_edit::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(toml_edit::Value::from)
            .or_else(|| n.as_f64().map(toml_edit::Value::from)),
        Value::String(s) => Some(s.as_str().into()),
        Value::Array(items) => {
            let mut array: Array = items.iter().filter_map(tree_to_toml_value).collect();
            array.fmt();
            Some(toml_edit::Value::Array(array))
        },
        Value::Object(fields) => {
            let mut table: InlineTable = fields
                .iter()
                .filter_map(|(key, field)| tree_to_toml_value(field).map(|v| (key.clone(), v)))
                .collect();
            table.fmt();
            Some(toml_edit::Value::InlineTable(table))
        },
    }
}

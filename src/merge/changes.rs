use crate::ServerMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// What an append-only merge added to one server entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerChange {
    /// Top-level keys of the entry that did not exist before.
    pub added_keys: Vec<String>,
    /// Keys added under the entry's `env` mapping.
    pub added_env_keys: Vec<String>,
    /// Values appended to each list field of the entry.
    pub added_array_items: Map<String, Value>,
}

impl ServerChange {
    fn is_empty(&self) -> bool {
        self.added_keys.is_empty()
            && self.added_env_keys.is_empty()
            && self.added_array_items.is_empty()
    }
}

/// Additions between two versions of a server map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerChanges {
    pub added_servers: Vec<String>,
    pub per_server: Map<String, Value>,
}

impl ServerChanges {
    /// Describes what `after` adds on top of `before`.
    ///
    /// Only additions are reported; append-only merges never produce removals.
    #[must_use]
    pub fn between(before: &ServerMap, after: &ServerMap) -> Self {
        let mut changes = Self::default();

        for (name, entry) in after {
            let change = match before.get(name) {
                None => {
                    changes.added_servers.push(name.clone());
                    entry_change(&Value::Object(Map::new()), entry)
                },
                Some(previous) => entry_change(previous, entry),
            };

            if !change.is_empty() {
                if let Ok(value) = serde_json::to_value(&change) {
                    changes.per_server.insert(name.clone(), value);
                }
            }
        }

        changes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_servers.is_empty() && self.per_server.is_empty()
    }
}

fn entry_change(before: &Value, after: &Value) -> ServerChange {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return ServerChange::default();
    };

    let added_keys = after.keys().filter(|key| !before.contains_key(*key)).cloned().collect();
    let added_env_keys = match (before.get("env"), after.get("env")) {
        (Some(Value::Object(old_env)), Some(Value::Object(new_env))) => {
            new_env.keys().filter(|key| !old_env.contains_key(*key)).cloned().collect()
        },
        (None, Some(Value::Object(new_env))) => new_env.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let added_array_items = after
        .iter()
        .filter_map(|(key, value)| {
            let items = value.as_array()?;
            let previous = before.get(key).and_then(Value::as_array);
            let appended: Vec<Value> = match previous {
                Some(old_items) => items.iter().skip(old_items.len()).cloned().collect(),
                None if before.contains_key(key) => Vec::new(),
                None => items.clone(),
            };
            (!appended.is_empty()).then(|| (key.clone(), Value::Array(appended)))
        })
        .collect();

    ServerChange { added_keys, added_env_keys, added_array_items }
}

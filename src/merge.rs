#![allow(clippy::self_named_module_files)]

//! Append-only deep merge.
//!
//! Existing data always wins: `incoming` may add mapping keys and list elements but never
//! overwrites a scalar, removes a key, or reorders a list already present in `existing`.

use crate::{ConfigTree, ServerMap};
use serde_json::Value;

pub mod changes;

pub use changes::{ServerChange, ServerChanges};

/// Deep-merges `incoming` into a copy of `existing`.
///
/// - mapping + mapping: keys missing from `existing` are copied in, shared keys recurse
/// - list + list: elements of `incoming` not structurally equal to any element of `existing`
///   are appended in `incoming` order
/// - anything else (scalars, type mismatch): `existing` is kept
#[must_use]
pub fn append_only(existing: &ConfigTree, incoming: &ConfigTree) -> ConfigTree {
    match (existing, incoming) {
        (Value::Object(existing_map), Value::Object(incoming_map)) => {
            Value::Object(merge_server_maps(existing_map, incoming_map))
        },
        (Value::Array(existing_items), Value::Array(incoming_items)) => {
            Value::Array(append_unique(existing_items, incoming_items))
        },
        (existing_value, _) => existing_value.clone(),
    }
}

/// Merges two mappings key by key.
///
/// At the server-map level this inserts unknown server names wholesale and deep-merges entries
/// that share a name; the same rule applies to every nested mapping.
#[must_use]
pub fn merge_server_maps(existing: &ServerMap, incoming: &ServerMap) -> ServerMap {
    let mut merged = existing.clone();

    for (key, incoming_value) in incoming {
        let value = match existing.get(key) {
            Some(existing_value) => append_only(existing_value, incoming_value),
            None => incoming_value.clone(),
        };
        merged.insert(key.clone(), value);
    }

    merged
}

fn append_unique(existing: &[Value], incoming: &[Value]) -> Vec<Value> {
    let mut merged = existing.to_vec();
    merged.extend(incoming.iter().filter(|item| !existing.contains(item)).cloned());
    merged
}

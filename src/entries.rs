//! Direct edits of server entries across targets (`add` / `remove`).
//!
//! Unlike synchronization these edits only touch files that already exist, and `add --force`
//! is the one place an existing entry may be replaced.

use crate::config::{reader, writer};
use crate::target::Target;
use crate::ServerMap;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "error")]
pub enum EntryDecision {
    Added,
    Replaced,
    WouldAdd,
    SkippedExists,
    SkippedMissingFile,
    Removed,
    WouldRemove,
    NotPresent,
    Failed(String),
}

impl EntryDecision {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Added | Self::Replaced => "ADD",
            Self::WouldAdd => "DRY",
            Self::SkippedExists | Self::NotPresent => "SKIP",
            Self::SkippedMissingFile => "WARNING",
            Self::Removed => "DEL",
            Self::WouldRemove => "DRY",
            Self::Failed(_) => "ERROR",
        }
    }

    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Added | Self::Replaced | Self::Removed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    pub target: String,
    pub path: PathBuf,
    pub key: String,
    #[serde(flatten)]
    pub decision: EntryDecision,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Replace entries that already exist.
    pub force: bool,
    pub dry_run: bool,
}

/// Add every entry of `entries` to each target whose file exists.
///
/// Failures are recorded per target; remaining targets are still processed.
pub fn add_entries(targets: &[Target], entries: &ServerMap, options: AddOptions) -> Vec<EntryOutcome> {
    let mut outcomes = Vec::new();

    for target in targets {
        let outcome = |key: &str, decision| EntryOutcome {
            target: target.name().to_string(),
            path: target.path().to_path_buf(),
            key: key.to_string(),
            decision,
        };

        if !target.exists() {
            warn!("{}: {} does not exist; skipping", target.name(), target.path().display());
            outcomes.extend(entries.keys().map(|key| outcome(key, EntryDecision::SkippedMissingFile)));
            continue;
        }

        let mut servers = match reader::read_server_map(target) {
            Ok(servers) => servers,
            Err(e) => {
                let message = e.to_string();
                outcomes.extend(
                    entries.keys().map(|key| outcome(key, EntryDecision::Failed(message.clone()))),
                );
                continue;
            },
        };

        let mut target_outcomes = Vec::new();
        for (key, payload) in entries {
            let exists = servers.contains_key(key);
            let decision = if exists && !options.force {
                EntryDecision::SkippedExists
            } else if options.dry_run {
                EntryDecision::WouldAdd
            } else {
                servers.insert(key.clone(), payload.clone());
                if exists {
                    EntryDecision::Replaced
                } else {
                    EntryDecision::Added
                }
            };
            target_outcomes.push(outcome(key, decision));
        }

        finish_target(target, &servers, &mut target_outcomes);
        outcomes.extend(target_outcomes);
    }

    outcomes
}

/// Remove `key` from each target whose file exists.
pub fn remove_entry(targets: &[Target], key: &str, dry_run: bool) -> Vec<EntryOutcome> {
    let mut outcomes = Vec::new();

    for target in targets {
        let outcome = |decision| EntryOutcome {
            target: target.name().to_string(),
            path: target.path().to_path_buf(),
            key: key.to_string(),
            decision,
        };

        if !target.exists() {
            debug!("{}: {} does not exist; skipping", target.name(), target.path().display());
            outcomes.push(outcome(EntryDecision::SkippedMissingFile));
            continue;
        }

        let mut servers = match reader::read_server_map(target) {
            Ok(servers) => servers,
            Err(e) => {
                outcomes.push(outcome(EntryDecision::Failed(e.to_string())));
                continue;
            },
        };

        let decision = if !servers.contains_key(key) {
            EntryDecision::NotPresent
        } else if dry_run {
            EntryDecision::WouldRemove
        } else {
            servers.shift_remove(key);
            EntryDecision::Removed
        };

        let mut target_outcomes = vec![outcome(decision)];
        finish_target(target, &servers, &mut target_outcomes);
        outcomes.extend(target_outcomes);
    }

    outcomes
}

/// Extract the entries to add from a pasted JSON document.
///
/// Accepts either `{"mcpServers": {...}}` or a mapping of names to entries.
///
/// # Errors
///
/// Returns an error if the document is not a JSON object.
pub fn entries_from_document(document: Value) -> Result<ServerMap, crate::McpsetError> {
    match document {
        Value::Object(mut map) => match map.shift_remove("mcpServers") {
            Some(Value::Object(servers)) => Ok(servers),
            Some(other) => {
                map.insert("mcpServers".to_string(), other);
                Ok(map)
            },
            None => Ok(map),
        },
        _ => Err(crate::McpsetError::Parse {
            path: "clipboard".to_string(),
            message: "expected {\"name\": {...}} or {\"mcpServers\": {...}}".to_string(),
        }),
    }
}

fn finish_target(target: &Target, servers: &ServerMap, outcomes: &mut [EntryOutcome]) {
    if !outcomes.iter().any(|outcome| outcome.decision.is_change()) {
        return;
    }

    if let Err(e) = writer::write_server_map(target, servers) {
        warn!("{}: failed to write {}: {e}", target.name(), target.path().display());
        for outcome in outcomes.iter_mut().filter(|outcome| outcome.decision.is_change()) {
            outcome.decision = EntryDecision::Failed(e.to_string());
        }
    }
}

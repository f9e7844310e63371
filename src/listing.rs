//! Read-only views over the servers held by each target (`mcpset list`).

use crate::config::reader;
use crate::target::{Target, TargetFormat};
use crate::ServerMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::warn;

/// Servers found in one target; unreadable files list as empty.
#[derive(Debug, Clone)]
pub struct TargetServers {
    pub target: Target,
    pub servers: ServerMap,
}

impl TargetServers {
    fn sorted_keys(&self) -> Vec<&String> {
        let mut keys: Vec<&String> = self.servers.keys().collect();
        keys.sort();
        keys
    }
}

/// Where a server name was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub target: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub format: TargetFormat,
}

pub fn read_all(targets: &[Target]) -> Vec<TargetServers> {
    targets
        .iter()
        .map(|target| {
            let servers = reader::read_server_map(target).unwrap_or_else(|e| {
                warn!("{}: {e}", target.name());
                ServerMap::new()
            });
            TargetServers { target: target.clone(), servers }
        })
        .collect()
}

/// Target name to its sorted server names.
pub fn keys_by_target(listing: &[TargetServers]) -> Map<String, Value> {
    listing
        .iter()
        .map(|entry| {
            let keys = entry.sorted_keys().into_iter().cloned().map(Value::String).collect();
            (entry.target.name().to_string(), Value::Array(keys))
        })
        .collect()
}

/// Server name to every target that defines it, sorted by target name.
pub fn group_by_server(listing: &[TargetServers]) -> BTreeMap<String, Vec<Location>> {
    let mut groups: BTreeMap<String, Vec<Location>> = BTreeMap::new();

    for entry in listing {
        for name in entry.servers.keys() {
            groups.entry(name.clone()).or_default().push(Location {
                target: entry.target.name().to_string(),
                path: entry.target.path().to_path_buf(),
                format: entry.target.format(),
            });
        }
    }

    for locations in groups.values_mut() {
        locations.sort_by(|a, b| a.target.cmp(&b.target));
    }
    groups
}

pub fn render_groups(groups: &BTreeMap<String, Vec<Location>>) -> String {
    let mut out = String::new();
    for (name, locations) in groups {
        let _ = writeln!(out, "* {name}");
        for location in locations {
            let _ = writeln!(out, "  - {}: {}", location.target, location.path.display());
        }
    }
    out
}

/// One `# name -> path` section per target followed by its entries.
///
/// With `as_json` each section holds the pretty-printed server map instead of one
/// `[key] value` line per server.
pub fn render_values(listing: &[TargetServers], as_json: bool) -> String {
    let mut out = String::new();

    for entry in listing {
        let _ = writeln!(out, "# {} -> {}", entry.target.name(), entry.target.path().display());
        if as_json {
            let value = Value::Object(entry.servers.clone());
            let _ = writeln!(out, "{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        } else {
            for key in entry.sorted_keys() {
                let value = entry.servers.get(key).map(Value::to_string).unwrap_or_default();
                let _ = writeln!(out, "[{key}] {value}");
            }
        }
        out.push('\n');
    }

    out
}

#![allow(missing_docs)]

use crate::config::{reader, writer, Config};
use crate::merge::{merge_server_maps, ServerChanges};
use crate::target::{normalize_name, Selection, Target, TargetFormat, TargetRegistry, CENTRAL_NAME};
use crate::ServerMap;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options shared by collection and distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and report decisions without writing anything.
    pub dry_run: bool,
    /// Copy a file aside before overwriting it.
    pub backup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Init,
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Merge result equals the file's current content.
    Unchanged,
    WouldUpdate,
    Updated,
    /// A source whose servers were folded into central.
    Collected,
    /// A source whose file does not exist.
    Missing,
    Failed,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unchanged => "SKIP",
            Self::WouldUpdate => "DRY",
            Self::Updated => "SYNC",
            Self::Collected => "READ",
            Self::Missing => "MISSING",
            Self::Failed => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub name: String,
    pub path: PathBuf,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ServerChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl TargetOutcome {
    fn new(target: &Target, decision: Decision) -> Self {
        Self {
            name: target.name().to_string(),
            path: target.path().to_path_buf(),
            decision,
            error: None,
            changes: None,
            backup: None,
        }
    }

    fn failed(target: &Target, error: impl std::fmt::Display) -> Self {
        warn!("{}: {error}", target.name());
        Self { error: Some(error.to_string()), ..Self::new(target, Decision::Failed) }
    }
}

/// Where a server in the collected central map came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// First target that contributed the server; `root` for pre-existing central entries.
    pub introduced_by: String,
    /// Every target holding the server, in fold order.
    pub sources: Vec<String>,
}

/// Result of folding sources into the central server map.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub servers: ServerMap,
    pub provenance: BTreeMap<String, Provenance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub operation: Operation,
    pub dry_run: bool,
    pub targets: Vec<TargetOutcome>,
    pub unknown_targets: Vec<String>,
    /// Server names of the collected central map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<BTreeMap<String, Provenance>>,
}

impl SyncReport {
    const fn new(operation: Operation, options: SyncOptions, unknown_targets: Vec<String>) -> Self {
        Self {
            operation,
            dry_run: options.dry_run,
            targets: Vec::new(),
            unknown_targets,
            servers: None,
            provenance: None,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.targets.iter().any(|outcome| outcome.decision == Decision::Failed)
    }

    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let value = serde_json::to_value(self).context("Failed to serialize report")?;
        writer::write_json_pretty(path, &value)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

/// Fold `sources` into `central` in order.
///
/// Servers already in `central` keep their scalars; among sources the earlier one wins.
#[must_use]
pub fn collect_server_maps(central: &ServerMap, sources: &[(String, ServerMap)]) -> Collection {
    let mut provenance: BTreeMap<String, Provenance> = central
        .keys()
        .map(|name| {
            let origin = Provenance {
                introduced_by: CENTRAL_NAME.to_string(),
                sources: vec![CENTRAL_NAME.to_string()],
            };
            (name.clone(), origin)
        })
        .collect();

    let mut servers = central.clone();
    for (source_name, source) in sources {
        for name in source.keys() {
            provenance
                .entry(name.clone())
                .and_modify(|origin| origin.sources.push(source_name.clone()))
                .or_insert_with(|| Provenance {
                    introduced_by: source_name.clone(),
                    sources: vec![source_name.clone()],
                });
        }
        servers = merge_server_maps(&servers, source);
    }

    Collection { servers, provenance }
}

/// Merge `central` into `destination`, returning the new map only if it differs.
#[must_use]
pub fn distribute_server_map(destination: &ServerMap, central: &ServerMap) -> Option<ServerMap> {
    let merged = merge_server_maps(destination, central);
    (merged != *destination).then_some(merged)
}

/// Update the central file with every server found in the selected sources.
///
/// # Errors
///
/// Returns an error if the central file cannot be read or parsed. Failures of individual
/// sources are recorded in the report instead.
pub fn collect_into_central(
    registry: &TargetRegistry,
    config: &Config,
    names: &[String],
    options: SyncOptions,
) -> Result<SyncReport> {
    let central = registry.central(&config.default_central_path);
    let central_servers = reader::read_server_map(&central)
        .with_context(|| format!("Failed to read central target: {}", central.path().display()))?;
    debug!("Central {} holds {} server(s)", central.path().display(), central_servers.len());

    let selection = select_peers(registry, &central, names);
    let mut report = SyncReport::new(Operation::Init, options, selection.unknown);

    let mut sources = Vec::new();
    for source in &selection.targets {
        if !source.exists() {
            debug!("{}: {} does not exist", source.name(), source.path().display());
            report.targets.push(TargetOutcome::new(source, Decision::Missing));
            continue;
        }

        match reader::read_server_map(source) {
            Ok(servers) => {
                debug!("{}: {} server(s)", source.name(), servers.len());
                report.targets.push(TargetOutcome::new(source, Decision::Collected));
                sources.push((source.name().to_string(), incoming_for(&central, servers)));
            },
            Err(e) => report.targets.push(TargetOutcome::failed(source, e)),
        }
    }

    let collection = collect_server_maps(&central_servers, &sources);
    let outcome = settle(&central, &central_servers, &collection.servers, options);
    report.targets.insert(0, outcome);
    report.servers = Some(collection.servers.keys().cloned().collect());
    report.provenance = Some(collection.provenance);

    Ok(report)
}

/// Append the central servers to every selected destination.
///
/// # Errors
///
/// Returns an error if the central file cannot be read or parsed. Failures of individual
/// destinations are recorded in the report instead.
pub fn distribute_from_central(
    registry: &TargetRegistry,
    config: &Config,
    names: &[String],
    options: SyncOptions,
) -> Result<SyncReport> {
    let central = registry.central(&config.default_central_path);
    let central_servers = reader::read_server_map(&central)
        .with_context(|| format!("Failed to read central target: {}", central.path().display()))?;
    if central_servers.is_empty() {
        info!("Central {} has no servers", central.path().display());
    }

    let selection = select_peers(registry, &central, names);
    let mut report = SyncReport::new(Operation::Sync, options, selection.unknown);
    let toml_central = writer::toml_representable(&central_servers);

    for destination in &selection.targets {
        let current = match reader::read_server_map(destination) {
            Ok(servers) => servers,
            Err(e) => {
                report.targets.push(TargetOutcome::failed(destination, e));
                continue;
            },
        };

        let incoming = match destination.format() {
            TargetFormat::Json => &central_servers,
            TargetFormat::Toml => &toml_central,
        };
        let outcome = match distribute_server_map(&current, incoming) {
            Some(updated) => settle(destination, &current, &updated, options),
            None => TargetOutcome::new(destination, Decision::Unchanged),
        };
        report.targets.push(outcome);
    }

    Ok(report)
}

/// Servers as they can be stored in `receiver`'s format.
fn incoming_for(receiver: &Target, servers: ServerMap) -> ServerMap {
    match receiver.format() {
        TargetFormat::Json => servers,
        TargetFormat::Toml => writer::toml_representable(&servers),
    }
}

/// Decide and, unless dry-running, perform the write of `after` over `before`.
fn settle(target: &Target, before: &ServerMap, after: &ServerMap, options: SyncOptions) -> TargetOutcome {
    if after == before {
        return TargetOutcome::new(target, Decision::Unchanged);
    }

    let changes = Some(ServerChanges::between(before, after));
    if options.dry_run {
        return TargetOutcome { changes, ..TargetOutcome::new(target, Decision::WouldUpdate) };
    }

    let backup = if options.backup {
        match writer::backup_file(target.path()) {
            Ok(backup) => backup,
            Err(e) => return TargetOutcome::failed(target, format!("backup failed: {e}")),
        }
    } else {
        None
    };

    if let Err(e) = writer::write_server_map(target, after) {
        return TargetOutcome { changes, ..TargetOutcome::failed(target, e) };
    }

    info!("{}: updated {}", target.name(), target.path().display());
    TargetOutcome { changes, backup, ..TargetOutcome::new(target, Decision::Updated) }
}

/// Select non-central targets by name; naming only the central target selects nothing.
fn select_peers(registry: &TargetRegistry, central: &Target, names: &[String]) -> Selection {
    let peers = registry.non_central(central);
    let requested: Vec<String> = names
        .iter()
        .filter(|name| normalize_name(name) != normalize_name(central.name()))
        .cloned()
        .collect();

    if !names.is_empty() && requested.is_empty() {
        return Selection::default();
    }

    let selection = TargetRegistry::select(&peers, &requested);
    for name in &selection.unknown {
        warn!("Unknown target: {name}");
    }
    selection
}

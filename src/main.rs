#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use mcpset::{
    cli::{Cli, Commands},
    clipboard,
    config::Config,
    entries::{self, AddOptions, EntryOutcome},
    listing,
    sync_operations::{self, SyncOptions, SyncReport},
    target::{Target, TargetRegistry},
    template, ServerMap,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.debug, cli.trace);

    let config = Config::new(cli.config_dir).context("Failed to resolve configuration directory")?;
    debug!("Using configuration directory: {}", config.config_dir().display());

    if let Err(e) = dispatch_command(cli.command, &config) {
        error!("{e:#}");
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing with the specified debug/trace flags
fn initialize_tracing(debug: bool, trace: bool) {
    let log_level = if trace {
        Level::TRACE
    } else if debug {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy())
        .init();
}

/// Dispatch to the appropriate command handler
fn dispatch_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Files { verbose } => run_files(config, verbose),
        Commands::Templates { show } => run_templates(config, show.as_deref()),
        Commands::List { files, values, view_mcp, json } => {
            run_list(config, &files, values, view_mcp, json)
        },
        Commands::Add {
            key,
            from_json,
            from_file,
            from_clipboard,
            template,
            sets,
            files,
            force,
            dry_run,
        } => {
            let payload = if from_clipboard {
                EntrySource::Clipboard
            } else if let Some(json) = from_json {
                EntrySource::Json(json)
            } else if let Some(path) = from_file {
                EntrySource::File(path)
            } else if let Some(name) = template {
                EntrySource::Template { name, sets }
            } else {
                anyhow::bail!("one of --from-json, --from-file, --from-clipboard or --template is required");
            };
            run_add(config, key, payload, &files, AddOptions { force, dry_run })
        },
        Commands::Remove { key, files, dry_run } => run_remove(config, &key, &files, dry_run),
        Commands::Init { files, apply, json, backup, report } => {
            let options = SyncOptions { dry_run: !apply, backup };
            run_init(config, &files, options, json, report.as_deref())
        },
        Commands::Sync { files, dry_run, backup, report } => {
            run_sync(config, &files, SyncOptions { dry_run, backup }, report.as_deref())
        },
        Commands::Clipboard { files, paths, stdout } => run_clipboard(config, &files, &paths, stdout),
    }
}

fn load_registry(config: &Config) -> Result<TargetRegistry> {
    TargetRegistry::load(&config.targets_path)
}

/// Resolve `-f` names against the registry, warning about names that match nothing.
fn select_targets(registry: &TargetRegistry, names: &[String]) -> Vec<Target> {
    let selection = TargetRegistry::select(registry.targets(), names);
    if !selection.unknown.is_empty() {
        warn!("Unknown target(s): {}", selection.unknown.join(", "));
    }
    selection.targets
}

fn run_files(config: &Config, verbose: bool) -> Result<()> {
    let registry = load_registry(config)?;
    if registry.is_empty() {
        println!("No targets registered in {}", config.targets_path.display());
        return Ok(());
    }

    for target in registry.targets() {
        let exists = target.exists();
        if verbose {
            println!(
                "{}\t{}\troot={}\t{}\t{}",
                target.name(),
                target.format(),
                target.root_key(),
                if exists { "EXISTS" } else { "MISSING" },
                target.path().display()
            );
        } else {
            println!(
                "{}: {} ({}){}",
                target.name(),
                target.path().display(),
                target.format(),
                if exists { "*" } else { "" }
            );
        }
    }

    Ok(())
}

fn run_templates(config: &Config, show: Option<&str>) -> Result<()> {
    let templates = template::load_templates(&config.templates_path)?;

    if let Some(name) = show {
        let found = templates
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Template not found: {name}"))?;
        println!("{}", serde_json::to_string_pretty(found)?);
        return Ok(());
    }

    if templates.is_empty() {
        println!("No templates in {}", config.templates_path.display());
    }
    for (name, body) in &templates {
        match body.get("description").and_then(Value::as_str) {
            Some(description) => println!("{name}: {description}"),
            None => println!("{name}"),
        }
    }

    Ok(())
}

fn run_list(config: &Config, files: &[String], values: bool, view_mcp: bool, json: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let listing = listing::read_all(&select_targets(&registry, files));

    if view_mcp {
        let groups = listing::group_by_server(&listing);
        if json {
            println!("{}", serde_json::to_string_pretty(&groups)?);
        } else {
            print!("{}", listing::render_groups(&groups));
        }
    } else if values {
        print!("{}", listing::render_values(&listing, json));
    } else {
        let keys = Value::Object(listing::keys_by_target(&listing));
        println!("{}", serde_json::to_string_pretty(&keys)?);
    }

    Ok(())
}

enum EntrySource {
    Json(String),
    File(PathBuf),
    Clipboard,
    Template { name: String, sets: Vec<String> },
}

fn read_entries(config: &Config, key: Option<String>, source: EntrySource) -> Result<ServerMap> {
    let single = |payload: Value| -> Result<ServerMap> {
        let key = key.clone().context("KEY is required")?;
        let mut entries = ServerMap::new();
        entries.insert(key, payload);
        Ok(entries)
    };

    match source {
        EntrySource::Json(json) => {
            let payload = serde_json::from_str(&json).context("Failed to parse --from-json")?;
            single(payload)
        },
        EntrySource::File(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read entry file: {}", path.display()))?;
            let payload = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse entry file: {}", path.display()))?;
            single(payload)
        },
        EntrySource::Template { name, sets } => {
            let templates = template::load_templates(&config.templates_path)?;
            single(template::render_template(&templates, &name, &sets)?)
        },
        EntrySource::Clipboard => {
            let text = clipboard::get_clipboard()?;
            let document: Value =
                serde_json::from_str(&text).context("Clipboard does not hold valid JSON")?;
            let entries = entries::entries_from_document(document)?;
            if entries.is_empty() {
                anyhow::bail!("Clipboard JSON holds no server entries");
            }
            Ok(entries)
        },
    }
}

fn run_add(
    config: &Config,
    key: Option<String>,
    source: EntrySource,
    files: &[String],
    options: AddOptions,
) -> Result<()> {
    let entries = read_entries(config, key, source)?;
    let registry = load_registry(config)?;
    let targets = select_targets(&registry, files);

    let outcomes = entries::add_entries(&targets, &entries, options);
    print_entry_outcomes(&outcomes);
    fail_on_entry_errors(&outcomes)
}

fn run_remove(config: &Config, key: &str, files: &[String], dry_run: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let targets = select_targets(&registry, files);

    let outcomes = entries::remove_entry(&targets, key, dry_run);
    print_entry_outcomes(&outcomes);
    fail_on_entry_errors(&outcomes)
}

fn print_entry_outcomes(outcomes: &[EntryOutcome]) {
    use entries::EntryDecision as D;

    for outcome in outcomes {
        let detail = match &outcome.decision {
            D::Added => "added".to_string(),
            D::Replaced => "replaced".to_string(),
            D::WouldAdd => "would add".to_string(),
            D::SkippedExists => "already exists (use --force to replace)".to_string(),
            D::SkippedMissingFile => "file does not exist".to_string(),
            D::Removed => "removed".to_string(),
            D::WouldRemove => "would remove".to_string(),
            D::NotPresent => "not present".to_string(),
            D::Failed(message) => message.clone(),
        };
        println!(
            "[{}] {} ({}): {} {detail}",
            outcome.decision.label(),
            outcome.target,
            outcome.path.display(),
            outcome.key
        );
    }
}

fn fail_on_entry_errors(outcomes: &[EntryOutcome]) -> Result<()> {
    let failed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome.decision, entries::EntryDecision::Failed(_)))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} change(s) failed");
    }
    Ok(())
}

fn run_init(
    config: &Config,
    files: &[String],
    options: SyncOptions,
    json: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let registry = load_registry(config)?;
    let report = sync_operations::collect_into_central(&registry, config, files, options)?;

    if json {
        let names = report.servers.clone().unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        print_sync_report(&report);
        if options.dry_run {
            println!("Preview only; run with --apply to write the central file.");
        }
    }

    finish_report(&report, report_path)
}

fn run_sync(
    config: &Config,
    files: &[String],
    options: SyncOptions,
    report_path: Option<&Path>,
) -> Result<()> {
    let registry = load_registry(config)?;
    let report = sync_operations::distribute_from_central(&registry, config, files, options)?;

    print_sync_report(&report);
    finish_report(&report, report_path)
}

fn print_sync_report(report: &SyncReport) {
    for outcome in &report.targets {
        let mut line =
            format!("[{}] {} ({})", outcome.decision.label(), outcome.name, outcome.path.display());

        if let Some(changes) = &outcome.changes {
            if !changes.added_servers.is_empty() {
                line.push_str(&format!(" +servers: {}", changes.added_servers.join(", ")));
            }
            let extended: Vec<&String> = changes
                .per_server
                .keys()
                .filter(|name| !changes.added_servers.contains(name))
                .collect();
            if !extended.is_empty() {
                let names: Vec<&str> = extended.iter().map(|name| name.as_str()).collect();
                line.push_str(&format!(" extended: {}", names.join(", ")));
            }
        }
        if let Some(backup) = &outcome.backup {
            line.push_str(&format!(" backup: {}", backup.display()));
        }
        if let Some(message) = &outcome.error {
            line.push_str(&format!(": {message}"));
        }

        println!("{line}");
    }

    if !report.unknown_targets.is_empty() {
        println!("[WARNING] unknown target(s): {}", report.unknown_targets.join(", "));
    }
}

fn finish_report(report: &SyncReport, report_path: Option<&Path>) -> Result<()> {
    if let Some(path) = report_path {
        report.write_report(path)?;
        debug!("Wrote report to {}", path.display());
    }

    if report.has_failures() {
        anyhow::bail!("one or more targets failed; see the [ERROR] lines above");
    }
    Ok(())
}

fn run_clipboard(config: &Config, files: &[String], paths: &[String], stdout: bool) -> Result<()> {
    let registry = load_registry(config)?;
    let central = registry.central(&config.default_central_path);

    let targets = if files.is_empty() {
        vec![central]
    } else {
        let mut known = registry.targets().to_vec();
        if !known.iter().any(|target| target.name() == central.name()) {
            known.push(central);
        }
        select_targets(&TargetRegistry::new(known), files)
    };

    let blocks = clipboard::collect_blocks(&targets, paths);
    let bundle = clipboard::render_bundle(&blocks)?;

    if stdout {
        println!("{bundle}");
    } else {
        clipboard::set_clipboard(&bundle)?;
        println!("Copied {} file(s) to the clipboard", blocks.len());
    }

    Ok(())
}

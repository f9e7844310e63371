use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mcpset",
    about = "Unified MCP config manager - keep MCP server definitions consistent across tools",
    long_about = "mcpset keeps the MCP server definitions of several tools consistent through one central file.

It helps you:
  • Collect every tool's servers into the central file (init)
  • Append the central servers to every tool (sync)
  • Add, remove and inspect server entries across all tools at once

Merging is append-only: existing keys and list items are never overwritten or removed.

Configuration files are stored in $MCPSET_CONFIG_DIR (or ~/.mcp/):
  • mcpset.targets.json: managed files ({\"targets\": [{name, path, type, root}]})
  • mcpset.templates.json: server entry templates
  • config.json: default central file when no \"root\" target is declared",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output (shows INFO and DEBUG messages)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace output (shows all log messages including TRACE)
    #[arg(short = 't', long, global = true)]
    pub trace: bool,

    /// Directory holding mcpset.targets.json and mcpset.templates.json
    #[arg(long, global = true, env = "MCPSET_CONFIG_DIR", value_hint = clap::ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List managed files
    Files {
        /// Show format, root key and existence of each file
        #[arg(long)]
        verbose: bool,
    },

    /// List templates or show one
    Templates {
        /// Print the named template
        #[arg(long, value_name = "NAME")]
        show: Option<String>,
    },

    /// List server keys per target
    List {
        /// Target names to include (default: all)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Print server entries as well
        #[arg(long)]
        values: bool,

        /// Group by server name, showing which targets define it
        #[arg(long)]
        view_mcp: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a server entry to every selected target that exists
    #[command(
        group(ArgGroup::new("source").required(true).args(["from_json", "from_file", "from_clipboard", "template"])),
        long_about = "Add a server entry to every selected target whose file exists.

An entry that already exists is left alone unless --force is given.

Examples:
  # Inline JSON
  mcpset add fs --from-json '{\"command\": \"npx\", \"args\": [\"-y\", \"fs\"]}'

  # From a template, filling {{TOKEN}}
  mcpset add github --template github --set TOKEN=ghp_xxx -f cursor claude

  # Every entry on the clipboard ({\"mcpServers\": {...}} or {\"name\": {...}})
  mcpset add --from-clipboard"
    )]
    Add {
        /// Server name (not needed with --from-clipboard)
        #[arg(value_name = "KEY", required_unless_present = "from_clipboard")]
        key: Option<String>,

        /// Inline JSON entry
        #[arg(short = 'j', long, value_name = "JSON")]
        from_json: Option<String>,

        /// Read the entry from a JSON file
        #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
        from_file: Option<PathBuf>,

        /// Read one or more entries from the clipboard
        #[arg(short = 'c', long)]
        from_clipboard: bool,

        /// Render the entry from a template
        #[arg(long, value_name = "NAME")]
        template: Option<String>,

        /// Template variable assignment
        #[arg(long = "set", value_name = "VAR=VAL", requires = "template")]
        sets: Vec<String>,

        /// Target names to change (default: all)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Replace entries that already exist
        #[arg(long)]
        force: bool,

        /// Preview changes without writing them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Remove a server entry from every selected target
    Remove {
        /// Server name
        #[arg(value_name = "KEY")]
        key: String,

        /// Target names to change (default: all)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Preview changes without writing them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Merge every target's servers into the central file
    #[command(long_about = "Merge every target's servers into the central file.

Sources are folded in registry order onto the current central servers; for scalar conflicts the
central value, then the earliest source, wins. Without --apply only a preview is shown.

Examples:
  # Preview
  mcpset init

  # Write the central file, keeping a backup
  mcpset init --apply --backup")]
    Init {
        /// Source target names (default: all)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Write the central file
        #[arg(long)]
        apply: bool,

        /// Print the merged server names as JSON
        #[arg(long)]
        json: bool,

        /// Create timestamped backup before making changes
        #[arg(short, long)]
        backup: bool,

        /// Write a JSON change report
        #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
        report: Option<PathBuf>,
    },

    /// Append the central servers to every target
    #[command(long_about = "Append the central servers to every target.

Each destination gains missing servers, missing keys and missing list items. Nothing a
destination already holds is changed, and destinations that would not change are not written.

Examples:
  # Preview changes without writing
  mcpset sync --dry-run

  # Only some targets, with a report
  mcpset sync -f cursor codex --report sync-report.json")]
    Sync {
        /// Destination target names (default: all)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Preview changes without writing them
        #[arg(short, long)]
        dry_run: bool,

        /// Create timestamped backup before making changes
        #[arg(short, long)]
        backup: bool,

        /// Write a JSON change report
        #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
        report: Option<PathBuf>,
    },

    /// Copy target files to the clipboard as labelled blocks
    Clipboard {
        /// Target names to copy (default: the central file)
        #[arg(short = 'f', long = "file", value_name = "NAME", num_args = 1..)]
        files: Vec<String>,

        /// Extra file to include
        #[arg(short = 'p', long = "path", value_name = "PATH")]
        paths: Vec<String>,

        /// Print to stdout instead of the clipboard
        #[arg(long)]
        stdout: bool,
    },
}

#![allow(missing_docs)]

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod entries;
pub mod listing;
pub mod merge;
pub mod sync_operations;
pub mod target;
pub mod template;

pub use config::Config;
pub use merge::{append_only, merge_server_maps};
pub use target::{Target, TargetFormat, TargetRegistry};

/// Parsed configuration content: mapping, sequence or scalar.
pub type ConfigTree = serde_json::Value;

/// Server name to server entry, in insertion order.
pub type ServerMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum McpsetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML document error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

use crate::McpsetError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the central target.
pub const CENTRAL_NAME: &str = "root";

/// Accepted synonym for [`CENTRAL_NAME`].
pub const CENTRAL_ALIAS: &str = "central";

/// Root key of the synthesized central target.
pub const DEFAULT_ROOT_KEY: &str = "mcpServers";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Json,
    Toml,
}

impl TargetFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Toml => f.write_str("toml"),
        }
    }
}

/// One configuration file taking part in synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    path: PathBuf,
    format: TargetFormat,
    root_key: String,
}

impl Target {
    /// Builds a target, expanding a leading `~` in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name, path or root key is empty.
    pub fn new(
        name: impl Into<String>,
        path: impl AsRef<str>,
        format: TargetFormat,
        root_key: impl Into<String>,
    ) -> Result<Self, McpsetError> {
        let name = name.into();
        let root_key = root_key.into();
        let raw_path = path.as_ref();

        if name.trim().is_empty() {
            return Err(McpsetError::InvalidTarget("target name is empty".to_string()));
        }
        if raw_path.trim().is_empty() {
            return Err(McpsetError::InvalidTarget(format!("{name}: path is empty")));
        }
        if root_key.trim().is_empty() {
            return Err(McpsetError::InvalidTarget(format!("{name}: root key is empty")));
        }

        Ok(Self { name, path: expand_home(raw_path), format, root_key })
    }

    /// Builds a target from one registry record.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, is not a string, or holds an
    /// unsupported format.
    pub fn from_record(record: &Value) -> Result<Self, McpsetError> {
        let field = |key: &str| {
            record.get(key).and_then(Value::as_str).ok_or_else(|| {
                McpsetError::InvalidTarget(format!("record is missing string field '{key}'"))
            })
        };

        let name = field("name")?;
        let path = field("path")?;
        let raw_format = field("type")?;
        let root_key = field("root")?;

        let format = TargetFormat::parse(raw_format).ok_or_else(|| {
            McpsetError::InvalidTarget(format!("{name}: unsupported type '{raw_format}'"))
        })?;

        Self::new(name, path, format, root_key)
    }

    /// The in-memory central target used when the registry declares none.
    #[must_use]
    pub fn default_central(path: PathBuf) -> Self {
        Self {
            name: CENTRAL_NAME.to_string(),
            path,
            format: TargetFormat::Json,
            root_key: DEFAULT_ROOT_KEY.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn format(&self) -> TargetFormat {
        self.format
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn is_central(&self) -> bool {
        self.name == CENTRAL_NAME || self.name == CENTRAL_ALIAS
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Expands a leading `~` to the current user's home directory.
#[must_use]
pub fn expand_home(raw: &str) -> PathBuf {
    let home = || directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

    if raw == "~" {
        return home().unwrap_or_else(|| PathBuf::from(raw));
    }

    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => home().map_or_else(|| PathBuf::from(raw), |home| home.join(rest)),
        None => PathBuf::from(raw),
    }
}

/// Maps the `central` synonym onto the canonical central name.
#[must_use]
pub fn normalize_name(name: &str) -> &str {
    if name == CENTRAL_ALIAS {
        CENTRAL_NAME
    } else {
        name
    }
}

/// Targets picked by name, plus the requested names nothing matched.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub targets: Vec<Target>,
    pub unknown: Vec<String>,
}

/// Ordered list of valid targets loaded from the registry file.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    #[must_use]
    pub const fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Loads the registry from `path`.
    ///
    /// A missing file is an empty registry. Records that fail validation are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No target registry at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read target registry: {}", path.display()))?;
        let document: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse target registry: {}", path.display()))?;

        Ok(Self::from_document(&document))
    }

    /// Builds a registry from a parsed `{ "targets": [...] }` document.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        let records = document.get("targets").and_then(Value::as_array);

        let targets = records
            .into_iter()
            .flatten()
            .filter_map(|record| match Target::from_record(record) {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("Skipping registry record: {e}");
                    None
                },
            })
            .collect();

        Self { targets }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Resolves the central target, synthesizing one at `default_path` if none is declared.
    #[must_use]
    pub fn central(&self, default_path: &Path) -> Target {
        self.targets
            .iter()
            .find(|target| target.is_central())
            .cloned()
            .unwrap_or_else(|| Target::default_central(default_path.to_path_buf()))
    }

    /// Every registered target that is not `central`.
    #[must_use]
    pub fn non_central(&self, central: &Target) -> Vec<Target> {
        self.targets.iter().filter(|target| target.name() != central.name()).cloned().collect()
    }

    /// Picks targets out of `universe` by name, keeping registry order.
    ///
    /// An empty name list selects the whole universe.
    #[must_use]
    pub fn select(universe: &[Target], names: &[String]) -> Selection {
        if names.is_empty() {
            return Selection { targets: universe.to_vec(), unknown: Vec::new() };
        }

        let mut wanted: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            let name = normalize_name(name);
            if !wanted.contains(&name) {
                wanted.push(name);
            }
        }

        let targets: Vec<Target> = universe
            .iter()
            .filter(|target| wanted.contains(&normalize_name(target.name())))
            .cloned()
            .collect();

        // Unknown names are reported in the order they were requested.
        let unknown = wanted
            .iter()
            .filter(|name| !targets.iter().any(|t| normalize_name(t.name()) == **name))
            .map(|name| (*name).to_string())
            .collect();

        Selection { targets, unknown }
    }
}

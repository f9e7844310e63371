#![allow(clippy::self_named_module_files)]

use std::path::{Path, PathBuf};

pub mod reader;
pub mod writer;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "MCPSET_CONFIG_DIR";

const TARGETS_FILE: &str = "mcpset.targets.json";
const TEMPLATES_FILE: &str = "mcpset.templates.json";
const CENTRAL_FILE: &str = "config.json";

/// Locations of mcpset's own files.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub targets_path: PathBuf,
    pub templates_path: PathBuf,
    pub default_central_path: PathBuf,
}

impl Config {
    /// Resolves the configuration directory.
    ///
    /// Precedence: `override_dir`, then `$MCPSET_CONFIG_DIR`, then `~/.mcp`.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the home directory cannot be determined.
    pub fn new(override_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_dir = match override_dir {
            Some(dir) => dir,
            None => Self::get_config_dir()?,
        };
        Ok(Self::with_dir(config_dir))
    }

    pub fn with_dir<P: Into<PathBuf>>(config_dir: P) -> Self {
        let config_dir = config_dir.into();
        Self {
            targets_path: config_dir.join(TARGETS_FILE),
            templates_path: config_dir.join(TEMPLATES_FILE),
            default_central_path: config_dir.join(CENTRAL_FILE),
            config_dir,
        }
    }

    /// Gets the configuration directory path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        if let Some(dir) = std::env::var(CONFIG_DIR_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            return Ok(PathBuf::from(dir));
        }

        let home = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .home_dir()
            .to_path_buf();
        Ok(home.join(".mcp"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

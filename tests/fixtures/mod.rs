#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Test fixture for a temporary mcpset configuration directory and the tool files it manages
pub struct TestFixture {
    /// Temporary directory that will be cleaned up on drop
    pub temp: TempDir,
    /// Path to the config directory (what `MCPSET_CONFIG_DIR` points at)
    pub config: PathBuf,
    /// Directory holding the managed tool files
    pub tools: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directories
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join("mcp");
        let tools_dir = temp_dir.path().join("tools");

        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&tools_dir)?;

        Ok(Self { temp: temp_dir, config: config_dir, tools: tools_dir })
    }

    /// Path of a managed tool file
    pub fn tool_path(&self, file: &str) -> PathBuf {
        self.tools.join(file)
    }

    /// Write a managed tool file and return its path
    pub fn write_tool(&self, file: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.tool_path(file);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write `mcpset.targets.json` from `(name, file, type, root)` records; files live in `tools`
    pub fn with_targets(&self, targets: &[(&str, &str, &str, &str)]) -> std::io::Result<&Self> {
        let records: Vec<Value> = targets
            .iter()
            .map(|(name, file, kind, root)| {
                json!({
                    "name": name,
                    "path": self.tool_path(file).to_string_lossy(),
                    "type": kind,
                    "root": root,
                })
            })
            .collect();
        let document = json!({ "targets": records });
        fs::write(self.config.join("mcpset.targets.json"), document.to_string())?;
        Ok(self)
    }

    /// Write `mcpset.templates.json`
    pub fn with_templates(&self, templates: &Value) -> std::io::Result<&Self> {
        let document = json!({ "templates": templates });
        fs::write(self.config.join("mcpset.templates.json"), document.to_string())?;
        Ok(self)
    }

    /// Parse a managed JSON tool file
    pub fn read_json(&self, file: &str) -> Value {
        let content = fs::read_to_string(self.tool_path(file)).expect("Failed to read tool file");
        serde_json::from_str(&content).expect("Failed to parse tool file")
    }

    /// Read a managed tool file as text
    pub fn read_text(&self, file: &str) -> String {
        fs::read_to_string(self.tool_path(file)).expect("Failed to read tool file")
    }
}

/// Standard registry used by several suites: a central file, two JSON tools and a TOML tool
pub const STANDARD_TARGETS: &[(&str, &str, &str, &str)] = &[
    ("root", "central.json", "json", "mcpServers"),
    ("cursor", "cursor.json", "json", "mcpServers"),
    ("claude", "claude.json", "json", "mcpServers"),
    ("codex", "codex.toml", "toml", "mcp_servers"),
];

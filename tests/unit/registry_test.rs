use crate::fixtures::{TestFixture, STANDARD_TARGETS};
use mcpset::target::{TargetFormat, TargetRegistry};
use mcpset::Config;
use std::fs;

#[test]
fn test_load_registry_from_file() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.with_targets(STANDARD_TARGETS).expect("Failed to write registry");
    let config = Config::with_dir(&fixture.config);

    let registry = TargetRegistry::load(&config.targets_path).expect("registry should load");

    let names: Vec<&str> = registry.targets().iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["root", "cursor", "claude", "codex"]);
    assert_eq!(registry.targets()[3].format(), TargetFormat::Toml);
    assert_eq!(registry.targets()[3].root_key(), "mcp_servers");

    let central = registry.central(&config.default_central_path);
    assert_eq!(central.path(), fixture.tool_path("central.json"));
    let others: Vec<String> =
        registry.non_central(&central).iter().map(|t| t.name().to_string()).collect();
    assert_eq!(others, vec!["cursor", "claude", "codex"]);
}

#[test]
fn test_missing_registry_synthesizes_central() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let config = Config::with_dir(&fixture.config);

    let registry = TargetRegistry::load(&config.targets_path).expect("missing file is fine");
    assert!(registry.is_empty());

    let central = registry.central(&config.default_central_path);
    assert_eq!(central.name(), "root");
    assert_eq!(central.path(), fixture.config.join("config.json"));
    assert_eq!(central.root_key(), "mcpServers");
}

#[test]
fn test_invalid_registry_is_an_error() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let config = Config::with_dir(&fixture.config);
    fs::write(&config.targets_path, "{ not json").expect("Failed to write registry");

    let error = TargetRegistry::load(&config.targets_path).expect_err("should fail");
    assert!(error.to_string().contains("mcpset.targets.json"));
}

#[test]
fn test_registry_expands_home_in_paths() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let config = Config::with_dir(&fixture.config);
    fs::write(
        &config.targets_path,
        r#"{"targets": [{"name": "cursor", "path": "~/.cursor/mcp.json", "type": "json", "root": "mcpServers"}]}"#,
    )
    .expect("Failed to write registry");

    let registry = TargetRegistry::load(&config.targets_path).expect("registry should load");

    let path = registry.targets()[0].path();
    assert!(!path.to_string_lossy().starts_with('~'));
    assert!(path.ends_with(".cursor/mcp.json"));
}

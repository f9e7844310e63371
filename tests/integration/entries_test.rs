use crate::fixtures::{TestFixture, STANDARD_TARGETS};
use mcpset::entries::{add_entries, remove_entry, AddOptions, EntryDecision};
use mcpset::template::{load_templates, render_template};
use mcpset::{Config, ServerMap, TargetRegistry};
use pretty_assertions::assert_eq;
use serde_json::json;

fn setup() -> (TestFixture, Config, TargetRegistry) {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.with_targets(STANDARD_TARGETS).expect("Failed to write registry");
    let config = Config::with_dir(&fixture.config);
    let registry = TargetRegistry::load(&config.targets_path).expect("registry should load");
    (fixture, config, registry)
}

#[test]
fn test_add_template_entry_to_json_and_toml() {
    let (fixture, config, registry) = setup();
    fixture
        .with_templates(&json!({
            "github": {
                "description": "GitHub MCP server",
                "data": {"command": "npx", "env": {"GITHUB_TOKEN": "{{TOKEN}}"}}
            }
        }))
        .expect("Failed to write templates");
    fixture.write_tool("cursor.json", r#"{"mcpServers": {}}"#).expect("Failed to write cursor");
    fixture.write_tool("codex.toml", "model = \"o3\"\n").expect("Failed to write codex");

    let templates = load_templates(&config.templates_path).expect("templates should load");
    let payload = render_template(&templates, "github", &["TOKEN=ghp_123".to_string()])
        .expect("render should succeed");
    let mut entries = ServerMap::new();
    entries.insert("github".to_string(), payload);

    let outcomes = add_entries(registry.targets(), &entries, AddOptions::default());

    let decisions: Vec<(&str, &EntryDecision)> =
        outcomes.iter().map(|o| (o.target.as_str(), &o.decision)).collect();
    assert_eq!(
        decisions,
        vec![
            ("root", &EntryDecision::SkippedMissingFile),
            ("cursor", &EntryDecision::Added),
            ("claude", &EntryDecision::SkippedMissingFile),
            ("codex", &EntryDecision::Added),
        ]
    );
    assert_eq!(
        fixture.read_json("cursor.json"),
        json!({"mcpServers": {"github": {"command": "npx", "env": {"GITHUB_TOKEN": "ghp_123"}}}})
    );
    let codex = fixture.read_text("codex.toml");
    assert!(codex.starts_with("model = \"o3\""));
    assert!(codex.contains("[mcp_servers.github]"));
    assert!(codex.contains("ghp_123"));
}

#[test]
fn test_remove_from_selected_targets_only() {
    let (fixture, _config, registry) = setup();
    fixture
        .write_tool("cursor.json", r#"{"mcpServers": {"fs": {}, "git": {}}}"#)
        .expect("Failed to write cursor");
    fixture.write_tool("claude.json", r#"{"mcpServers": {"fs": {}}}"#).expect("Failed to write claude");

    let selection = TargetRegistry::select(registry.targets(), &["cursor".to_string()]);
    let outcomes = remove_entry(&selection.targets, "fs", false);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].decision, EntryDecision::Removed);
    assert_eq!(fixture.read_json("cursor.json"), json!({"mcpServers": {"git": {}}}));
    assert_eq!(fixture.read_json("claude.json"), json!({"mcpServers": {"fs": {}}}));
}

#[test]
fn test_remove_from_toml_target() {
    let (fixture, _config, registry) = setup();
    fixture
        .write_tool(
            "codex.toml",
            "[mcp_servers.fs]\ncommand = \"npx\"\n\n[mcp_servers.git]\ncommand = \"git-mcp\"\n",
        )
        .expect("Failed to write codex");

    let selection = TargetRegistry::select(registry.targets(), &["codex".to_string()]);
    let outcomes = remove_entry(&selection.targets, "fs", false);

    assert_eq!(outcomes[0].decision, EntryDecision::Removed);
    let codex = fixture.read_text("codex.toml");
    assert!(!codex.contains("[mcp_servers.fs]"));
    assert!(codex.contains("[mcp_servers.git]"));
}

use crate::fixtures::TestFixture;
use mcpset::config::{reader, writer};
use mcpset::target::{Target, TargetFormat};
use mcpset::{merge_server_maps, ServerMap};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn codex_target(fixture: &TestFixture) -> Target {
    Target::new(
        "codex",
        fixture.tool_path("codex.toml").to_string_lossy(),
        TargetFormat::Toml,
        "mcp_servers",
    )
    .expect("valid target")
}

const CODEX_CONFIG: &str = r#"# Codex CLI configuration
model = "o3"
approval_policy = "on-request"

[mcp_servers.github]
command = "npx" # pinned by hand
args = ["-y", "@modelcontextprotocol/server-github"]
env = { GITHUB_TOKEN = "token" }

[profiles.fast]
model = "o4-mini"
"#;

#[test]
fn test_toml_append_keeps_untouched_content() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.write_tool("codex.toml", CODEX_CONFIG).expect("Failed to write tool file");
    let target = codex_target(&fixture);

    let current = reader::read_server_map(&target).expect("read");
    let incoming: ServerMap = json!({"fs": {"command": "npx", "args": ["-y", "fs"]}})
        .as_object()
        .cloned()
        .unwrap_or_default();
    let merged = merge_server_maps(&current, &incoming);
    writer::write_server_map(&target, &merged).expect("write");

    let text = fixture.read_text("codex.toml");
    assert!(text.starts_with("# Codex CLI configuration\nmodel = \"o3\""));
    assert!(text.contains(r#"command = "npx" # pinned by hand"#));
    assert!(text.contains("[profiles.fast]"));
    assert!(text.contains("[mcp_servers.fs]"));

    let reread = reader::read_server_map(&target).expect("read back");
    assert_eq!(
        Value::Object(reread),
        json!({
            "github": {
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-github"],
                "env": {"GITHUB_TOKEN": "token"}
            },
            "fs": {"command": "npx", "args": ["-y", "fs"]}
        })
    );
}

#[test]
fn test_toml_extended_entry_is_edited_in_place() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.write_tool("codex.toml", CODEX_CONFIG).expect("Failed to write tool file");
    let target = codex_target(&fixture);

    let current = reader::read_server_map(&target).expect("read");
    let incoming: ServerMap = json!({"github": {"env": {"GITHUB_HOST": "github.com"}}})
        .as_object()
        .cloned()
        .unwrap_or_default();
    writer::write_server_map(&target, &merge_server_maps(&current, &incoming)).expect("write");

    let reread = reader::read_server_map(&target).expect("read back");
    assert_eq!(
        reread.get("github").and_then(|entry| entry.get("env")),
        Some(&json!({"GITHUB_TOKEN": "token", "GITHUB_HOST": "github.com"}))
    );
    let text = fixture.read_text("codex.toml");
    assert!(text.contains("approval_policy = \"on-request\""));
    assert!(text.contains(r#"command = "npx" # pinned by hand"#));
}

#[test]
fn test_toml_missing_file_is_created() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let target = codex_target(&fixture);
    let servers: ServerMap =
        json!({"fs": {"command": "npx"}}).as_object().cloned().unwrap_or_default();

    writer::write_server_map(&target, &servers).expect("write");

    let text = fixture.read_text("codex.toml");
    assert!(text.contains("[mcp_servers.fs]"));
    assert_eq!(Value::Object(reader::read_server_map(&target).expect("read")), json!({"fs": {"command": "npx"}}));
}

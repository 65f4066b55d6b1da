//! Integration tests for configuration loading and validation

use parley_core::config::{
    load_from_json, load_from_path, load_from_yaml, ConfigError, ValidationErrorKind,
};
use parley_core::cookbook::CookbookTool;
use parley_core::dispatcher::{
    FixedSelection, HandlingMode, ToolCallDispatcher, ToolPolicy, UnknownToolPolicy,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn cookbook_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/cookbook.yaml")
}

#[test]
fn test_shipped_cookbook_config() {
    let config = load_from_yaml(cookbook_path()).unwrap();

    assert_eq!(config.tools.len(), 3);
    for tool in CookbookTool::ALL {
        assert_eq!(config.tool(tool.name()).map(|t| t.mode), Some(tool.mode()));
    }
    assert_eq!(config.session.pending_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.unknown_tools, UnknownToolPolicy::Ignore);

    let policy = ToolPolicy::from_config(&config, Arc::new(FixedSelection(0)));
    let dispatcher = ToolCallDispatcher::new(policy);
    assert_eq!(
        dispatcher.policy().mode("getLocation"),
        Some(HandlingMode::AutomaticSilent)
    );
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
  "version": "0.1",
  "unknown_tools": "reject",
  "tools": [
    { "name": "askForConfirmation", "mode": "interactive-confirmation",
      "confirm_literal": "Sure.", "deny_literal": "Nope." }
  ]
}"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.unknown_tools, UnknownToolPolicy::Reject);
    assert_eq!(config.session.max_steps, 5);

    let literals = config.tools[0].confirmation_literals();
    assert_eq!(literals.confirm, "Sure.");
    assert_eq!(literals.deny, "Nope.");
}

#[test]
fn test_env_var_interpolation() {
    std::env::set_var("PARLEY_IT_CANCEL", "Gave up waiting.");

    let yaml = r#"
version: "0.1"
session:
  cancel_literal: ${PARLEY_IT_CANCEL}
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yml", yaml);

    let config = load_from_path(path).unwrap();
    assert_eq!(config.session.cancel_literal, "Gave up waiting.");

    std::env::remove_var("PARLEY_IT_CANCEL");
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
version: "0.1"
session:
  cancel_literal: ${PARLEY_IT_NOT_SET}
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "PARLEY_IT_NOT_SET"),
        other => panic!("Expected EnvVarNotFound, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    let result = load_from_yaml("/nonexistent/parley.yaml");
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.toml", "version = \"0.1\"");

    let result = load_from_path(path);
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
}

#[test]
fn test_parse_error_reports_location() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "version: \"0.1\"\ntools: [\n");

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
version: "0.1"
tools:
  - name: getLocation
    mode: automatic-silent
    candidates: ["Chicago"]
    retries: 3
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    assert!(matches!(
        load_from_yaml(path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_automatic_tool_without_candidates() {
    let yaml = r#"
version: "0.1"
tools:
  - name: getLocation
    mode: automatic-silent
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "tools[0].candidates");
            assert!(matches!(err.kind, ValidationErrorKind::RequiredFieldMissing));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

#[test]
fn test_pending_timeout_shorter_than_executor() {
    let yaml = r#"
version: "0.1"
session:
  pending_timeout_ms: 1000
  executor_timeout_ms: 5000
tools:
  - name: getWeatherInformation
    mode: remote-executed
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "session.pending_timeout_ms");
            assert!(matches!(err.kind, ValidationErrorKind::Incompatible { .. }));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

//! Integration tests for configuration management
//!
//! Loads configuration files from disk, checks default creation and the
//! rejection of invalid values.

use std::fs;
use tempfile::TempDir;

use rxassist_engine::config::Config;
use rxassist_sdk::AssistantError;

const FULL_CONFIG: &str = r#"
[core]
log_level = "debug"
download_dir = "/tmp/rxassist-downloads"

[backend]
base_url = "https://rx.example.org/api/"
request_timeout_secs = 600
connect_timeout_secs = 5

[live]
enabled = false
url = "wss://rx.example.org/ws"
reconnect = false
reconnect_delay_secs = 2

[workflow]
welcome_message = "Hi there"
welcome_delay_secs = 0
announce_failures = true
"#;

#[test]
fn test_load_full_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(
        config.core.download_dir.to_str(),
        Some("/tmp/rxassist-downloads")
    );
    // Trailing slash is dropped so endpoint paths join cleanly
    assert_eq!(config.backend.base_url, "https://rx.example.org/api");
    assert_eq!(config.backend.request_timeout_secs, 600);
    assert!(!config.live.enabled);
    assert!(!config.live.reconnect);
    assert_eq!(config.live.url, "wss://rx.example.org/ws");
    assert_eq!(config.workflow.welcome_message, "Hi there");
    assert_eq!(config.workflow.welcome_delay_secs, 0);
    assert!(config.workflow.announce_failures);
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[backend]\nbase_url = \"http://10.0.0.4:8000\"\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    let defaults = Config::default();

    assert_eq!(config.backend.base_url, "http://10.0.0.4:8000");
    assert_eq!(
        config.backend.request_timeout_secs,
        defaults.backend.request_timeout_secs
    );
    assert_eq!(config.live, defaults.live);
    assert_eq!(config.workflow, defaults.workflow);
    assert_eq!(config.core.log_level, "info");
}

#[test]
fn test_create_default_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let created = Config::create_default(&path).unwrap();
    assert!(path.exists());

    let written = fs::read_to_string(&path).unwrap();
    // The file keeps the unexpanded home-relative path
    assert!(written.contains("~/.rxassist/downloads"));

    let loaded = Config::load_from_path(&path).unwrap();
    assert_eq!(loaded, created);
    assert!(!loaded.core.download_dir.starts_with("~"));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let result = Config::load_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(AssistantError::Config(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        "[core]\nlog_level = \"verbose\"\n",
        "[backend]\nbase_url = \"localhost:8000\"\n",
        "[backend]\nrequest_timeout_secs = 0\n",
        "[backend]\nconnect_timeout_secs = 0\n",
        "[live]\nurl = \"http://localhost:8000/ws\"\n",
        "[backend]\nrequest_timeout_secs = \"soon\"\n",
        "this is not toml",
    ];

    for contents in cases {
        match Config::from_toml(contents) {
            Err(AssistantError::Config(message)) => assert!(!message.is_empty()),
            other => panic!("expected config error for {contents:?}, got {other:?}"),
        }
    }
}

use std::{env, fs};

use proofmint_core::TemplatePreset;
use proofmint_server::config::loader::load_config;
use proofmint_server::{AppConfig, StorageBackend};

const VALID_TOML: &str = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 1024
cors_origins = ["http://localhost:3000", "https://app.example"]

[logging]
level = "debug"

[google]
client_id = "client-123.apps.googleusercontent.com"
client_secret = "google-secret"
redirect_uri = "http://localhost:8081/oauth2callback"

[proof]
endpoint = "http://proof.internal:9000/"
app_id = "0xapp"
app_secret = "0xsecret"

[storage]
backend = "http"
upload_url = "https://pin.example/upload"
api_key = "storage-key"
gateway = "https://gateway.example"

[timeouts]
proof_generation_ms = 90000

[metadata]
template = "titled"
snapshot_path = "metadata.json"
"#;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("proofmint.toml");
    fs::write(&path, VALID_TOML).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.cors_origins.len(), 2);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");
    assert_eq!(cfg.google.client_id, "client-123.apps.googleusercontent.com");
    assert_eq!(cfg.google.token_endpoint, "https://oauth2.googleapis.com/token");
    assert_eq!(cfg.storage.backend, StorageBackend::Http);
    assert_eq!(cfg.storage.gateway.as_deref(), Some("https://gateway.example"));
    assert_eq!(cfg.timeouts.proof_generation_ms, 90_000);
    assert_eq!(cfg.timeouts.publish_ms, 60_000);
    assert_eq!(cfg.metadata.template, TemplatePreset::Titled);
    assert!(cfg.metadata.snapshot_path.is_some());

    // 2) Env override should win over file
    unsafe {
        env::set_var("PROOFMINT__TOKEN_STORE__TTL_SECS", "120");
        env::set_var("PROOFMINT__PROOF__APP_ID", "0xfromenv");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.token_store.ttl_secs, 120);
    assert_eq!(cfg_env.proof.app_id, "0xfromenv");
    unsafe {
        env::remove_var("PROOFMINT__TOKEN_STORE__TTL_SECS");
        env::remove_var("PROOFMINT__PROOF__APP_ID");
    }

    // 3) Legacy flat variables fill in what the file leaves out, but never override it
    let partial_path = dir.path().join("partial.toml");
    fs::write(
        &partial_path,
        r#"
[google]
redirect_uri = "http://localhost:8080/oauth2callback"

[proof]
app_secret = "0xsecret"

[storage]
backend = "memory"
"#,
    )
    .expect("write partial toml");
    unsafe {
        env::set_var("GOOGLE_CLIENT_ID", "legacy-client");
        env::set_var("GOOGLE_CLIENT_SECRET", "legacy-secret");
        env::set_var("APP_ID", "0xlegacy");
        env::set_var("APP_SECRET", "0xignored");
    }
    let cfg_legacy = load_config(partial_path.to_str()).expect("legacy variables should satisfy validation");
    assert_eq!(cfg_legacy.google.client_id, "legacy-client");
    assert_eq!(cfg_legacy.google.client_secret, "legacy-secret");
    assert_eq!(cfg_legacy.proof.app_id, "0xlegacy");
    assert_eq!(cfg_legacy.proof.app_secret, "0xsecret");
    assert_eq!(cfg_legacy.storage.backend, StorageBackend::Memory);
    unsafe {
        env::remove_var("GOOGLE_CLIENT_ID");
        env::remove_var("GOOGLE_CLIENT_SECRET");
        env::remove_var("APP_ID");
        env::remove_var("APP_SECRET");
    }

    // 4) Missing credentials are all reported together
    let empty_path = dir.path().join("empty.toml");
    fs::write(&empty_path, "[server]\nport = 8080\n").expect("write empty toml");
    let err = load_config(empty_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("missing required configuration"));
    for key in [
        "google.client_id",
        "google.client_secret",
        "google.redirect_uri",
        "proof.app_id",
        "proof.app_secret",
        "storage.api_key",
    ] {
        assert!(err.contains(key), "{key} not reported in: {err}");
    }

    // 5) Unknown template preset is a deserialize error
    let bad_template = dir.path().join("bad_template.toml");
    fs::write(
        &bad_template,
        r#"
[google]
client_id = "id"
client_secret = "secret"
redirect_uri = "http://localhost:8080/oauth2callback"

[proof]
app_id = "0xapp"
app_secret = "0xsecret"

[storage]
backend = "memory"

[metadata]
template = "fancy"
"#,
    )
    .expect("write bad template toml");
    let err = load_config(bad_template.to_str()).expect_err("expected deserialize error");
    assert!(err.contains("config deserialize error"));
}

#[test]
fn defaults_are_sane() {
    let cfg = AppConfig::default();
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.cors_origins, vec!["http://localhost:3000".to_string()]);
    assert_eq!(cfg.storage.backend, StorageBackend::Http);
    assert_eq!(cfg.metadata.template, TemplatePreset::Ownership);
    assert_eq!(cfg.google.consent_ttl_secs, 600);
    assert_eq!(cfg.timeouts.stage_timeouts().token_exchange.as_millis(), 10_000);
}

#[test]
fn memory_backend_needs_no_storage_credential() {
    let mut cfg = AppConfig::default();
    cfg.google.client_id = "id".into();
    cfg.google.client_secret = "secret".into();
    cfg.google.redirect_uri = "http://localhost:8080/oauth2callback".into();
    cfg.proof.app_id = "0xapp".into();
    cfg.proof.app_secret = "0xsecret".into();
    assert!(cfg.validate().unwrap_err().contains("storage.api_key"));

    cfg.storage.backend = StorageBackend::Memory;
    assert!(cfg.validate().is_ok());

    cfg.timeouts.publish_ms = 0;
    assert!(cfg.validate().unwrap_err().contains("timeouts"));
}

#[test]
fn secrets_are_redacted_in_debug_output() {
    let mut cfg = AppConfig::default();
    cfg.google.client_secret = "google-secret".into();
    cfg.proof.app_secret = "0xsecret".into();
    cfg.storage.api_key = "storage-key".into();

    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("google-secret"));
    assert!(!rendered.contains("0xsecret"));
    assert!(!rendered.contains("storage-key"));
}

//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use paczkomat_infra::config;
use paczkomat_infra::{ApiClientConfig, AuthFlowSettings};
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "oauth": {
            "base_url": "http://127.0.0.1:8081",
            "client_id": "test-client"
        },
        "api": {
            "base_url": "http://127.0.0.1:8082",
            "timeout_seconds": 20
        },
        "auth": {
            "language": "en",
            "refresh_buffer_seconds": 300
        }
    }"#;

    let mut temp_file = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.oauth.base_url, "http://127.0.0.1:8081");
    assert_eq!(config.oauth.client_id, "test-client");
    // Fields absent from the file keep their defaults
    assert_eq!(config.oauth.redirect_uri, "https://account.inpost-group.com/callback");
    assert_eq!(config.api.timeout_seconds, 20);
    assert_eq!(config.auth.language, "en");
    assert_eq!(config.auth.refresh_buffer_seconds, 300);
    assert_eq!(config.auth.request_timeout_seconds, 30);
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[api]
base_url = "http://127.0.0.1:9000"
parcel_lockers_url = "http://127.0.0.1:9000/points.json"

[auth]
email_confirmation_timeout_seconds = 60.0
"#;

    let mut temp_file = NamedTempFile::with_suffix(".toml").expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    assert_eq!(config.api.parcel_lockers_url, "http://127.0.0.1:9000/points.json");
    assert!((config.auth.email_confirmation_timeout_seconds - 60.0).abs() < f64::EPSILON);
    assert_eq!(config.auth.language, "pl");
}

#[test]
fn test_loaded_config_drives_clients() {
    let mut temp_file = NamedTempFile::with_suffix(".toml").expect("Failed to create temp file");
    writeln!(
        temp_file,
        "[oauth]\nbase_url = \"http://127.0.0.1:7000/\"\n[api]\nbase_url = \"http://127.0.0.1:7001\"\ntimeout_seconds = 5"
    )
    .expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf())).expect("config");
    let flow = AuthFlowSettings::from(&config);
    let api = ApiClientConfig::from(&config);

    assert_eq!(flow.oauth_base_url, "http://127.0.0.1:7000");
    assert_eq!(flow.token_url, "http://127.0.0.1:7001/global/oauth2/token");
    assert_eq!(api.base_url, "http://127.0.0.1:7001");
    assert_eq!(api.timeout.as_secs(), 5);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let mut temp_file = NamedTempFile::with_suffix(".toml").expect("Failed to create temp file");
    temp_file.write_all(b"[auth\nlanguage = ").expect("Failed to write to temp file");

    let result = config::load_from_file(Some(temp_file.path().to_path_buf()));
    assert!(matches!(result, Err(paczkomat_domain::PaczkomatError::Config(_))));
}

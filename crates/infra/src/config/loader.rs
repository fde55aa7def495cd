//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Start from built-in defaults (every field has one)
//! 2. If a config file is found, it replaces the defaults it names
//! 3. Environment variables override both
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PACZKOMAT_OAUTH_BASE_URL`: Account service base URL
//! - `PACZKOMAT_API_BASE_URL`: Mobile API base URL
//! - `PACZKOMAT_LANGUAGE`: Login language (`pl`, `en`, ...)
//! - `PACZKOMAT_REFRESH_BUFFER_SECONDS`: Refresh window before token expiry
//! - `PACZKOMAT_API_TIMEOUT_SECONDS`: Timeout for mobile API calls
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./paczkomat.json` or `./paczkomat.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use paczkomat_domain::{Config, PaczkomatError, Result};

/// Load configuration: defaults, then an optional file, then environment
/// overrides.
///
/// A missing file is not an error.
///
/// # Errors
/// Returns `PaczkomatError::Config` if a config file exists but is invalid,
/// or an environment variable has an invalid value, and
/// `PaczkomatError::InvalidInput` if the merged values fail
/// [`Config::validate`].
pub fn load() -> Result<Config> {
    let config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(config)
}

/// Load configuration from environment variables on top of the defaults
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `PaczkomatError::Config` if a variable has an invalid value, or
/// `PaczkomatError::InvalidInput` if the result fails validation.
pub fn load_from_env() -> Result<Config> {
    apply_env_overrides(Config::default())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `PaczkomatError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PaczkomatError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PaczkomatError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PaczkomatError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `PaczkomatError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PaczkomatError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PaczkomatError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(PaczkomatError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("paczkomat.json"),
        dir.join("paczkomat.toml"),
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Some(url) = env_string("PACZKOMAT_OAUTH_BASE_URL") {
        config.oauth.base_url = url;
    }
    if let Some(url) = env_string("PACZKOMAT_API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(language) = env_string("PACZKOMAT_LANGUAGE") {
        config.auth.language = language;
    }
    if let Some(buffer) = env_parse::<i64>("PACZKOMAT_REFRESH_BUFFER_SECONDS")? {
        config.auth.refresh_buffer_seconds = buffer;
    }
    if let Some(timeout) = env_parse::<u64>("PACZKOMAT_API_TIMEOUT_SECONDS")? {
        config.api.timeout_seconds = timeout;
    }
    config.validate()?;
    Ok(config)
}

/// Non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `PaczkomatError::Config` if the variable is set but not a number.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| PaczkomatError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STARTUP_DELAY_MS,
    STORE_FILE_NAME,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for WardenView.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store_path: String,
    pub refresh_interval_ms: u64,
    pub startup_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub log_payloads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_payloads: false,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_store_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("wardenview")
        .join(STORE_FILE_NAME)
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            store_path: env::var("WARDENVIEW_STORE_PATH")
                .map(expand_tilde)
                .unwrap_or_else(|_| default_store_path()),
            refresh_interval_ms: env_u64(
                "WARDENVIEW_REFRESH_INTERVAL_MS",
                DEFAULT_REFRESH_INTERVAL_MS,
            ),
            startup_delay_ms: env_u64("WARDENVIEW_STARTUP_DELAY_MS", DEFAULT_STARTUP_DELAY_MS),
            request_timeout_secs: env_u64(
                "WARDENVIEW_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            log_payloads: env_flag_enabled("WARDENVIEW_LOG_PAYLOADS"),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Host and API token for the remote bookmark service.
///
/// Held explicitly by the dispatcher instead of process globals; rebuilt
/// from the cache whenever the configuration is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub token: String,
}

impl Credentials {
    /// Build credentials from optional cached values.
    ///
    /// # Returns
    /// `None` unless both values are present and non-blank. The host is
    /// trimmed and stripped of trailing slashes.
    pub fn from_parts(host: Option<String>, token: Option<String>) -> Option<Self> {
        let host = normalize_host(host?.as_str());
        let token = token?.trim().to_string();
        if host.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self { host, token })
    }
}

/// Trim whitespace and trailing slashes from a host URL.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

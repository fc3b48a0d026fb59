//! Bridge configuration.
//!
//! Stored as JSON at `~/.config/harmony-bridge/config.json`
//! (`%APPDATA%\harmony-bridge\config.json` on Windows). The
//! `HARMONY_BRIDGE_CONFIG` environment variable points at another file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use harmony_auth::Credential;
use harmony_hub_connection::SessionTimeouts;
use harmony_protocol::constants::{AUTH_URL, HUB_PORT};
use harmony_remote::RefreshSchedule;

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "HARMONY_BRIDGE_CONFIG";

/// Bridge configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host name or IP address of the hub.
    pub hub_address: String,

    #[serde(default = "default_hub_port")]
    pub hub_port: u16,

    /// Logitech account email.
    pub email: String,

    /// Logitech account password.
    pub password: String,

    /// Name the hub shows for this client.
    #[serde(default = "default_client_label")]
    pub client_label: String,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Seconds between token refreshes, aligned to wall-clock multiples.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_hub_port() -> u16 {
    HUB_PORT
}

fn default_client_label() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "harmony-bridge".into());
    format!("{host}#harmony-bridge#{}", env!("CARGO_PKG_VERSION"))
}

fn default_auth_url() -> String {
    AUTH_URL.into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("hub_address", &self.hub_address)
            .field("hub_port", &self.hub_port)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("client_label", &self.client_label)
            .field("auth_url", &self.auth_url)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}

impl BridgeConfig {
    /// Loads the configuration from the resolved path.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path(|key| std::env::var(key).ok())?;
        Self::load_from(&path)
    }

    /// Loads the configuration from `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: BridgeConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        if config.hub_address.trim().is_empty() {
            anyhow::bail!("hub_address is empty in {}", path.display());
        }
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// `host:port` of the hub.
    pub fn hub_addr(&self) -> String {
        format!("{}:{}", self.hub_address, self.hub_port)
    }

    pub fn credential(&self) -> Credential {
        Credential::new(&self.email, &self.password)
    }

    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn refresh_schedule(&self) -> RefreshSchedule {
        RefreshSchedule::every(Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Resolves the configuration file path from the environment.
fn config_path(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    #[cfg(target_os = "windows")]
    let base = env("APPDATA").map(PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = env("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| env("HOME").map(|home| PathBuf::from(home).join(".config")));

    let base = base.context("cannot locate a configuration directory")?;
    Ok(base.join("harmony-bridge").join("config.json"))
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::options::FetchOptions;

/// Global configuration loaded from `~/.config/tilefetch/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilefetchConfig {
    /// Total request timeout in seconds (None = transport default).
    pub timeout_secs: Option<f64>,
    /// Product identifier sent as `User-Agent` (None = `tilefetch/<version>`).
    pub user_agent: Option<String>,
    /// Keep URLs and reasons out of error messages (they still go to the log).
    pub hide_error_details: bool,
    /// Disable TLS certificate and hostname verification.
    pub insecure: bool,
    /// Keep cookies between requests that share a session.
    pub manage_cookies: bool,
    /// PEM bundle to trust instead of the system store.
    pub ca_cert_path: Option<PathBuf>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl TilefetchConfig {
    /// Fetch options for this configuration.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            ca_cert_path: self.ca_cert_path.clone(),
            insecure: self.insecure,
            manage_cookies: self.manage_cookies,
            hide_error_details: self.hide_error_details,
            extra_headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            timeout: self.timeout(),
        }
    }

    /// Configured timeout; non-positive or non-finite values mean "not set".
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tilefetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TilefetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TilefetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<TilefetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: TilefetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

//! Client configuration.
//!
//! Configuration is read from `~/.config/gobiz-proxy/config.json` when it
//! exists, then overridden by `GOBIZ_*` environment variables. Every field
//! has a default, so an empty file (or none at all) is valid.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for the config directory path
const APP_NAME: &str = "gobiz-proxy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "https://api.gobiz.co.id";
const DEFAULT_CLIENT_ID: &str = "go-biz-web-new";

/// GoBiz throttles clients that call faster than this per session.
const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 2000;

/// GoID needs time between the login request and the password exchange
/// before it accepts the second step. This is a platform constraint.
const DEFAULT_LOGIN_SETTLE_DELAY_MS: u64 = 3000;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size used when walking every page of a search.
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched by one exhaustive search.
const DEFAULT_MAX_SEARCH_PAGES: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub client_id: String,
    pub min_request_interval_ms: u64,
    pub login_settle_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub search_page_size: u32,
    pub max_search_pages: u32,
    /// Downstream statuses that trigger one refresh-and-retry.
    pub auth_failure_statuses: Vec<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            min_request_interval_ms: DEFAULT_MIN_REQUEST_INTERVAL_MS,
            login_settle_delay_ms: DEFAULT_LOGIN_SETTLE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            max_search_pages: DEFAULT_MAX_SEARCH_PAGES,
            auth_failure_statuses: vec![401],
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                debug!(path = %path.display(), "Loaded config file");
                serde_json::from_str(&contents).context("Failed to parse config file")?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `GOBIZ_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GOBIZ_BASE_URL") {
            self.base_url = url;
        }
        if let Some(id) = lookup("GOBIZ_CLIENT_ID") {
            self.client_id = id;
        }
        if let Some(ms) = lookup("GOBIZ_MIN_REQUEST_INTERVAL_MS") {
            self.min_request_interval_ms = ms
                .parse()
                .context("GOBIZ_MIN_REQUEST_INTERVAL_MS must be an integer")?;
        }
        if let Some(ms) = lookup("GOBIZ_LOGIN_SETTLE_DELAY_MS") {
            self.login_settle_delay_ms = ms
                .parse()
                .context("GOBIZ_LOGIN_SETTLE_DELAY_MS must be an integer")?;
        }
        if let Some(secs) = lookup("GOBIZ_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .parse()
                .context("GOBIZ_REQUEST_TIMEOUT_SECS must be an integer")?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn login_settle_delay(&self) -> Duration {
        Duration::from_millis(self.login_settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash, so endpoints can be appended.
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

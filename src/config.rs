// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::client::Timeouts;
use crate::context::AppContext;
use anyhow::{Context, Error, Result};
use http::Uri;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://fetch-hiring.s3.amazonaws.com/hiring.json";
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_probe_url() -> String {
    DEFAULT_PROBE_URL.to_string()
}

fn default_probe_connect_timeout() -> u64 {
    5
}
fn default_probe_read_timeout() -> u64 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    15
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    format!("fetchlist/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(default = "default_probe_connect_timeout")]
    pub probe_connect_timeout_secs: u64,
    #[serde(default = "default_probe_read_timeout")]
    pub probe_read_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            probe_url: default_probe_url(),
            probe_connect_timeout_secs: 5,
            probe_read_timeout_secs: 5,
            connect_timeout_secs: 10,
            read_timeout_secs: 15,
            max_redirects: 5,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Detects whether an error means the config file was simply absent,
    /// either through our own message or an IO NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
        })
    }

    /// Save configuration using an explicit context. The file is replaced
    /// atomically.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        let toml_str = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, toml_str)
            .with_context(|| format!("Failed to write '{}'", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace '{}'", path.display()))?;
        Ok(())
    }

    pub fn feed_uri(&self) -> Result<Uri> {
        self.feed_url
            .parse()
            .with_context(|| format!("Invalid feed URL '{}'", self.feed_url))
    }

    pub fn probe_uri(&self) -> Result<Uri> {
        self.probe_url
            .parse()
            .with_context(|| format!("Invalid probe URL '{}'", self.probe_url))
    }

    pub fn feed_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            read: Duration::from_secs(self.read_timeout_secs),
        }
    }

    pub fn probe_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.probe_connect_timeout_secs),
            read: Duration::from_secs(self.probe_read_timeout_secs),
        }
    }
}

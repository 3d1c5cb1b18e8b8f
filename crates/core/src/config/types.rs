use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::records::CatalogKind;
use crate::remote::PrhConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub remote: PrhConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Bulk and page loader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Records per bulk request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between two bulk requests, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Upper estimate of the author count, used until the API reports one.
    #[serde(default = "default_author_total_estimate")]
    pub author_total_estimate: usize,
    /// Upper estimate of the title count, used until the API reports one.
    #[serde(default = "default_title_total_estimate")]
    pub title_total_estimate: usize,
    /// Offset ceiling for "feeling lucky" when the title count is unknown.
    #[serde(default = "default_lucky_fallback_ceiling")]
    pub lucky_fallback_ceiling: usize,
    /// Collections to bulk-load in the background at startup.
    #[serde(default)]
    pub preload_on_start: Vec<CatalogKind>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            author_total_estimate: default_author_total_estimate(),
            title_total_estimate: default_title_total_estimate(),
            lucky_fallback_ceiling: default_lucky_fallback_ceiling(),
            preload_on_start: Vec::new(),
        }
    }
}

impl LoaderConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn total_estimate(&self, kind: CatalogKind) -> usize {
        match kind {
            CatalogKind::Authors => self.author_total_estimate,
            CatalogKind::Titles => self.title_total_estimate,
        }
    }
}

fn default_batch_size() -> usize {
    500
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_author_total_estimate() -> usize {
    100_000
}

fn default_title_total_estimate() -> usize {
    300_000
}

fn default_lucky_fallback_ceiling() -> usize {
    10_000
}

/// Sanitized config for API responses (api key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub remote: SanitizedRemoteConfig,
    pub loader: LoaderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRemoteConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub min_request_interval_ms: u64,
    pub cover_base_url: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            remote: SanitizedRemoteConfig {
                base_url: config.remote.base_url.clone(),
                api_key_configured: !config.remote.api_key.is_empty(),
                timeout_secs: config.remote.timeout_secs,
                min_request_interval_ms: config.remote.min_request_interval_ms,
                cover_base_url: config.remote.cover_base_url.clone(),
            },
            loader: config.loader.clone(),
            server: config.server.clone(),
        }
    }
}

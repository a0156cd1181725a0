use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chat::FailurePolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub plugin_base_url: String,
    pub play_endpoint: String,
    pub info_endpoint: String,
    pub probe_endpoint: String,
    pub request_timeout_secs: u64,

    // 0 = unbounded
    pub cache_size: usize,

    pub strict_macros: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            plugin_base_url: std::env::var("YT_PLUGIN_URL")
                .unwrap_or(defaults.plugin_base_url),
            play_endpoint: std::env::var("YT_PLAY_ENDPOINT")
                .unwrap_or(defaults.play_endpoint),
            info_endpoint: std::env::var("YT_INFO_ENDPOINT")
                .unwrap_or(defaults.info_endpoint),
            probe_endpoint: std::env::var("YT_PROBE_ENDPOINT")
                .unwrap_or(defaults.probe_endpoint),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            cache_size: match std::env::var("CACHE_SIZE") {
                Ok(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => 0,
            },

            strict_macros: std::env::var("STRICT_MACROS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The plugin base URL must parse as an absolute `http`/`https` URL
    /// - Every endpoint path must start with `/`
    /// - The request timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.plugin_base_url).map_err(|e| {
            anyhow::anyhow!("Invalid plugin base URL {}: {}", self.plugin_base_url, e)
        })?;

        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("Plugin base URL must use http or https, got: {}", base.scheme());
        }

        for (name, endpoint) in [
            ("play", &self.play_endpoint),
            ("info", &self.info_endpoint),
            ("probe", &self.probe_endpoint),
        ] {
            if !endpoint.starts_with('/') {
                anyhow::bail!("The {} endpoint must start with '/', got: {}", name, endpoint);
            }
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cache bound, `None` when the cache may grow for the whole process lifetime.
    pub fn cache_capacity(&self) -> Option<usize> {
        (self.cache_size > 0).then_some(self.cache_size)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.strict_macros {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Degrade
        }
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Plugin: {} (timeout {}s)\n  \
            Endpoints: play={} info={} probe={}\n  \
            Cache: {}\n  \
            Macros: {:?}",
            self.plugin_base_url,
            self.request_timeout_secs,
            self.play_endpoint,
            self.info_endpoint,
            self.probe_endpoint,
            self.cache_capacity()
                .map_or("unbounded".to_string(), |size| format!("{} entries", size)),
            self.failure_policy(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugin_base_url: "http://127.0.0.1:8000".to_string(),
            play_endpoint: crate::ui::embeds::DEFAULT_PLAY_ENDPOINT.to_string(),
            info_endpoint: "/api/plugins/youtube/info/".to_string(),
            probe_endpoint: "/api/plugins/youtube/probe".to_string(),
            request_timeout_secs: 30,
            cache_size: 0,
            strict_macros: false,
        }
    }
}

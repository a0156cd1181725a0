use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{MetadataFetcher, VideoInfo};
use crate::config::Config;
use crate::error::{Result, TubeError};

/// HTTP client for the chat server's YouTube plugin
pub struct PluginClient {
    client: reqwest::Client,
    base_url: String,
    info_endpoint: String,
    probe_endpoint: String,
}

impl PluginClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.plugin_base_url.trim_end_matches('/').to_string(),
            info_endpoint: config.info_endpoint.clone(),
            probe_endpoint: config.probe_endpoint.clone(),
        })
    }

    fn info_url(&self, canonical_url: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.info_endpoint,
            urlencoding::encode(canonical_url)
        )
    }

    /// Checks that the plugin endpoint is reachable.
    pub async fn probe(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, self.probe_endpoint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TubeError::Status(response.status().as_u16()));
        }

        debug!("✅ Plugin reachable at {}", url);
        Ok(())
    }

    /// Turns a response body into metadata. Empty bodies, non-object JSON,
    /// empty objects and error objects all mean "no info".
    pub(crate) fn parse_payload(body: &str) -> Option<VideoInfo> {
        if body.trim().is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️ Plugin returned invalid JSON: {}", e);
                return None;
            }
        };

        match value {
            Value::Object(map) if map.is_empty() || map.contains_key("error") => None,
            Value::Object(map) => match serde_json::from_value(Value::Object(map)) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("⚠️ Plugin payload does not look like video info: {}", e);
                    None
                }
            },
            _ => None,
        }
    }
}

#[async_trait]
impl MetadataFetcher for PluginClient {
    async fn fetch(&self, canonical_url: &str) -> Result<Option<VideoInfo>> {
        let url = self.info_url(canonical_url);
        debug!("📊 Fetching video info: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            warn!(
                "❌ Plugin answered {} for {}",
                response.status(),
                canonical_url
            );
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(Self::parse_payload(&body))
    }

    fn source_name(&self) -> &'static str {
        "plugin"
    }
}

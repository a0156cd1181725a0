pub mod plugin;
pub mod youtube;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use plugin::PluginClient;
pub use youtube::{extract_video_id, VideoId};

/// Source of video metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches metadata for a canonical `https://youtu.be/<id>` URL.
    ///
    /// `Ok(None)` means the source answered but had nothing usable; callers
    /// cache that outcome. `Err` is reserved for transport failures.
    async fn fetch(&self, canonical_url: &str) -> Result<Option<VideoInfo>>;

    fn source_name(&self) -> &'static str;
}

/// Metadata of a single video as returned by the plugin endpoint.
///
/// Fields the payload omits (or sends as `null`) fall back to empty values.
/// Anything beyond the known fields is kept in `extra` so macros can still
/// address it by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub thumbnail: String,
    /// Length in whole seconds
    #[serde(deserialize_with = "lenient_count")]
    pub duration: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub uploader: String,
    #[serde(deserialize_with = "lenient_count")]
    pub view_count: u64,
    /// `YYYYMMDD`
    #[serde(deserialize_with = "lenient_string")]
    pub upload_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoInfo {
    /// Looks up a field by its payload name, known fields included.
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "title" => Value::from(self.title.as_str()),
            "thumbnail" => Value::from(self.thumbnail.as_str()),
            "duration" => Value::from(self.duration),
            "uploader" => Value::from(self.uploader.as_str()),
            "view_count" => Value::from(self.view_count),
            "upload_date" => Value::from(self.upload_date.as_str()),
            "description" => Value::from(self.description.as_str()),
            "url" => Value::from(self.url.as_str()),
            _ => return self.extra.get(name).cloned(),
        };

        Some(value)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

// yt-dlp reports durations as floats for some extractors
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::TubeError;
    use std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// In-memory fetcher with per-id delays and failures, counting calls.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        infos: HashMap<String, VideoInfo>,
        delays: HashMap<String, Duration>,
        failing: HashSet<String>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_video(mut self, id: &str, info: VideoInfo) -> Self {
            self.infos.insert(id.to_string(), info);
            self
        }

        pub(crate) fn with_delay(mut self, id: &str, delay: Duration) -> Self {
            self.delays.insert(id.to_string(), delay);
            self
        }

        pub(crate) fn failing(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataFetcher for StubFetcher {
        async fn fetch(&self, canonical_url: &str) -> Result<Option<VideoInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = canonical_url
                .strip_prefix(youtube::CANONICAL_PREFIX)
                .unwrap_or(canonical_url);

            if let Some(delay) = self.delays.get(id) {
                tokio::time::sleep(*delay).await;
            }

            if self.failing.contains(id) {
                return Err(TubeError::Http("connection refused".to_string()));
            }

            Ok(self.infos.get(id).cloned())
        }

        fn source_name(&self) -> &'static str {
            "stub"
        }
    }

    pub(crate) fn sample_info() -> VideoInfo {
        VideoInfo {
            title: "Never Gonna Give You Up (Official Video)".to_string(),
            thumbnail: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
            duration: 213,
            uploader: "Rick Astley".to_string(),
            view_count: 1_500_000_000,
            upload_date: "20091025".to_string(),
            description: "The official video".to_string(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_info_tolerates_loose_payloads() {
        let info: VideoInfo = serde_json::from_value(json!({
            "title": "Clip",
            "duration": 125.7,
            "description": null,
            "view_count": 42,
            "like_count": 7,
            "tags": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(info.title, "Clip");
        assert_eq!(info.duration, 125);
        assert_eq!(info.description, "");
        assert_eq!(info.view_count, 42);
        assert_eq!(info.field("like_count"), Some(json!(7)));
        assert_eq!(info.field("tags"), Some(json!(["a", "b"])));
        assert_eq!(info.field("duration"), Some(json!(125)));
        assert_eq!(info.field("missing"), None);
    }
}

//! # Chat Module
//!
//! Post-processing of chat messages: `@<youtube link>` markers become inline
//! players and `{{yt-<name>::<arg>}}` macros expand to video metadata.
//!
//! ## Macro syntax
//!
//! ```text
//! {{yt-title::https://youtu.be/dQw4w9WgXcQ}}
//! {{yt-duration dQw4w9WgXcQ}}
//! ```
//!
//! The separator is either `::` or a single space, and the name is matched
//! without regard to case. See [`macros::MacroKind`] for the recognised names.

pub mod events;
pub mod macros;
pub mod substitute;

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::warn;

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::error::Result;
use crate::sources::MetadataFetcher;
use crate::ui::embeds::{rewrite_video_links_with, DEFAULT_PLAY_ENDPOINT};

pub use events::{ChatStore, EmbedSubsystem, InMemoryChatStore, MessageEvent};
pub use macros::{MacroKind, MacroResolver};
pub use substitute::substitute_async;

/// Text every macro starts with; messages without it skip the macro pass.
pub const MACRO_OPENING: &str = "{{yt-";

static MACRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{yt-([A-Za-z_-]+)(?:::| )([^}]+)\}\}").unwrap());

/// What to do when a single macro fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The failing macro expands to an empty string
    #[default]
    Degrade,
    /// The whole message fails
    Strict,
}

/// Rewrites a chat message: video links first, then macros.
pub struct MessagePipeline {
    resolver: MacroResolver,
    play_endpoint: String,
    failure_policy: FailurePolicy,
}

impl MessagePipeline {
    pub fn new(resolver: MacroResolver) -> Self {
        Self {
            resolver,
            play_endpoint: DEFAULT_PLAY_ENDPOINT.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        let cache = Arc::new(MetadataCache::new(fetcher, config.cache_capacity()));

        Self::new(MacroResolver::new(cache))
            .with_play_endpoint(config.play_endpoint.clone())
            .with_failure_policy(config.failure_policy())
    }

    pub fn with_play_endpoint(mut self, play_endpoint: String) -> Self {
        self.play_endpoint = play_endpoint;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        self.resolver.cache()
    }

    /// Returns the rewritten message text. The caller stores it.
    pub async fn process_message(&self, raw_text: &str) -> Result<String> {
        let text = rewrite_video_links_with(raw_text, &self.play_endpoint);

        if !text.contains(MACRO_OPENING) {
            return Ok(text);
        }

        let resolver = &self.resolver;
        let policy = self.failure_policy;

        substitute_async(&text, &MACRO_RE, move |caps| {
            let token = caps[0].to_string();
            let name = caps[1].to_string();
            let arg = caps[2].to_string();

            async move {
                match resolver.resolve(&name, &arg).await {
                    Err(e) if policy == FailurePolicy::Degrade => {
                        warn!("⚠️ Macro {} failed, expanding to nothing: {}", token, e);
                        Ok(String::new())
                    }
                    result => result,
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::{sample_info, StubFetcher};
    use crate::sources::{MockMetadataFetcher, VideoInfo};
    use crate::ui::embeds::rewrite_video_links;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn pipeline(fetcher: Arc<dyn MetadataFetcher>) -> MessagePipeline {
        MessagePipeline::new(MacroResolver::new(Arc::new(MetadataCache::new(fetcher, None))))
    }

    #[tokio::test]
    async fn test_plain_text_is_untouched() {
        let mut fetcher = MockMetadataFetcher::new();
        fetcher.expect_fetch().never();
        let pipeline = pipeline(Arc::new(fetcher));

        for text in ["hello", "", "{{not-a-macro}}", "{yt-title::x}", "email me@youtu.be"] {
            assert_eq!(pipeline.process_message(text).await.unwrap(), text);
        }
    }

    #[tokio::test]
    async fn test_links_and_macros_together() {
        let fetcher = Arc::new(StubFetcher::new().with_video("dQw4w9WgXcQ", sample_info()));
        let pipeline = pipeline(fetcher.clone());

        let out = pipeline
            .process_message(
                "Now playing {{yt-title::https://youtu.be/dQw4w9WgXcQ}} ({{YT-length dQw4w9WgXcQ}}) \
                 by {{yt-author::dQw4w9WgXcQ}}\n@https://youtu.be/dQw4w9WgXcQ",
            )
            .await
            .unwrap();

        assert_eq!(
            out,
            format!(
                "Now playing Never Gonna Give You Up (Official Video) ({{{{YT-length dQw4w9WgXcQ}}}}) by Rick Astley\n{}",
                rewrite_video_links("@https://youtu.be/dQw4w9WgXcQ")
            )
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_macro_name_is_case_insensitive() {
        let fetcher = Arc::new(StubFetcher::new().with_video("dQw4w9WgXcQ", sample_info()));
        let pipeline = pipeline(fetcher);

        let out = pipeline
            .process_message("{{yt-Duration::dQw4w9WgXcQ}} {{yt-id https://youtu.be/dQw4w9WgXcQ}}")
            .await
            .unwrap();

        assert_eq!(out, "3:33 dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_order_is_kept_across_concurrent_lookups() {
        let slow = VideoInfo {
            title: "Slow".to_string(),
            ..VideoInfo::default()
        };
        let fast = VideoInfo {
            title: "Fast".to_string(),
            ..VideoInfo::default()
        };
        let fetcher = Arc::new(
            StubFetcher::new()
                .with_video("aaaaaaaaaaa", slow)
                .with_delay("aaaaaaaaaaa", Duration::from_millis(40))
                .with_video("bbbbbbbbbbb", fast),
        );
        let pipeline = pipeline(fetcher.clone());

        let out = pipeline
            .process_message("1={{yt-title::aaaaaaaaaaa}} 2={{yt-title::bbbbbbbbbbb}} 3={{yt-title::aaaaaaaaaaa}}")
            .await
            .unwrap();

        assert_eq!(out, "1=Slow 2=Fast 3=Slow");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_macro_degrades_to_empty() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .with_video("dQw4w9WgXcQ", sample_info())
                .failing("bbbbbbbbbbb"),
        );
        let pipeline = pipeline(fetcher);

        let out = pipeline
            .process_message("[{{yt-channel::dQw4w9WgXcQ}}] [{{yt-title::bbbbbbbbbbb}}]")
            .await
            .unwrap();

        assert_eq!(out, "[Rick Astley] []");
    }

    #[tokio::test]
    async fn test_strict_policy_fails_the_message() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .with_video("dQw4w9WgXcQ", sample_info())
                .failing("bbbbbbbbbbb"),
        );
        let pipeline = pipeline(fetcher).with_failure_policy(FailurePolicy::Strict);

        let result = pipeline
            .process_message("[{{yt-channel::dQw4w9WgXcQ}}] [{{yt-title::bbbbbbbbbbb}}]")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_configured_play_endpoint() {
        let config = Config {
            play_endpoint: "/custom/play/".to_string(),
            ..Config::default()
        };
        let pipeline = MessagePipeline::from_config(&config, Arc::new(StubFetcher::new()));

        let out = pipeline.process_message("@youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert!(out.contains(r#"src="/custom/play/https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ""#));
    }
}

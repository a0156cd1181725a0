//! # Cache Module
//!
//! Memoization of video metadata lookups.
//!
//! [`MetadataCache`] sits between the macro resolver and the
//! [`MetadataFetcher`]: the first request for a video id goes out to the
//! fetcher, every later request is answered from memory.
//!
//! ## Features
//!
//! - **Negative caching**: a fetch that answers "no info" is remembered too
//! - **Single-flight**: concurrent lookups of the same uncached id share one fetch
//! - **Optional bound**: least recently used eviction once `CACHE_SIZE` is reached
//! - **Metrics**: hit/miss/eviction counters
//!
//! ## Configuration
//!
//! ```env
//! CACHE_SIZE=0    # 0 or unset keeps every entry for the process lifetime
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yt_chat_embed::cache::MetadataCache;
//! use yt_chat_embed::config::Config;
//! use yt_chat_embed::sources::{extract_video_id, PluginClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let cache = MetadataCache::new(Arc::new(PluginClient::new(&config)?), None);
//!
//! let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
//! if let Some(info) = cache.get_info(&id).await? {
//!     println!("{} by {}", info.title, info.uploader);
//! }
//! # Ok(())
//! # }
//! ```

pub mod lru_cache;

use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::debug;

use crate::error::Result;
use crate::sources::{MetadataFetcher, VideoId, VideoInfo};
pub use lru_cache::{CacheMetrics, LRUCache};

/// Cached outcome of a lookup; `None` is the "no info" marker.
pub type CachedInfo = Option<Arc<VideoInfo>>;

type InFlight = Shared<BoxFuture<'static, Result<CachedInfo>>>;

/// Per-id memo of metadata lookups with in-flight deduplication.
pub struct MetadataCache {
    fetcher: Arc<dyn MetadataFetcher>,
    entries: LRUCache<VideoId, CachedInfo>,
    in_flight: DashMap<VideoId, InFlight>,
    joined: AtomicU64,
}

impl MetadataCache {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, capacity: Option<usize>) -> Self {
        Self {
            fetcher,
            entries: LRUCache::new(capacity),
            in_flight: DashMap::new(),
            joined: AtomicU64::new(0),
        }
    }

    /// Returns the metadata for `id`, fetching it on first use.
    ///
    /// Successful outcomes, including "no info", are stored before returning.
    /// Errors are handed to every waiter but not stored.
    pub async fn get_info(&self, id: &VideoId) -> Result<CachedInfo> {
        if let Some(cached) = self.entries.get(id) {
            debug!("✅ Cache hit for video {}", id);
            return Ok(cached);
        }

        let pending = self.pending_fetch(id);
        let result = pending.clone().await;

        if let Ok(info) = &result {
            self.entries.insert(id.clone(), info.clone());
        }

        // Only drop the slot if it still holds this fetch; a newer one may have replaced it.
        self.in_flight
            .remove_if(id, |_, current| current.ptr_eq(&pending));

        result
    }

    fn pending_fetch(&self, id: &VideoId) -> InFlight {
        match self.in_flight.entry(id.clone()) {
            Entry::Occupied(slot) => {
                self.joined.fetch_add(1, Ordering::Relaxed);
                debug!("🔗 Joining in-flight fetch for video {}", id);
                slot.get().clone()
            }
            Entry::Vacant(slot) => {
                debug!("❌ Cache miss for video {}", id);
                let fetcher = Arc::clone(&self.fetcher);
                let url = id.canonical_url();
                let fetch = async move { fetcher.fetch(&url).await.map(|info| info.map(Arc::new)) }
                    .boxed()
                    .shared();
                slot.insert(fetch.clone());
                fetch
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            joined_in_flight: self.joined.load(Ordering::Relaxed),
            ..self.entries.metrics()
        }
    }
}

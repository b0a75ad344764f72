//! Reader content for stories: the Jina reader client and an LRU cache that
//! both prefetch tasks and the reader view share.

mod jina;

pub use jina::{ContentError, ReaderClient, DEFAULT_READER_BASE_URL};

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use url::Url;

const DEFAULT_CAPACITY: usize = 64;

/// Where a URL's reader content stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    Loading,
    Ready(Arc<str>),
    Failed(String),
}

/// Shared, bounded cache keyed by article URL. Clones share storage.
#[derive(Clone)]
pub struct ContentCache {
    inner: Arc<Mutex<LruCache<String, ContentState>>>,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ContentCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, url: &str) -> Option<ContentState> {
        self.inner.lock().ok()?.get(url).cloned()
    }

    pub fn insert(&self, url: &str, state: ContentState) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(url.to_string(), state);
        }
    }

    /// Whether content is ready or a fetch is already in flight.
    pub fn is_settled_or_loading(&self, url: &str) -> bool {
        matches!(
            self.get(url),
            Some(ContentState::Ready(_)) | Some(ContentState::Loading)
        )
    }

    /// Forget a URL only if its fetch never finished.
    pub fn discard_loading(&self, url: &str) {
        if let Ok(mut cache) = self.inner.lock() {
            if matches!(cache.peek(url), Some(ContentState::Loading)) {
                cache.pop(url);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for a story URL: the parsed, normalised form when it parses.
pub fn cache_key(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.as_str().to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Fetch `url` through `reader` and record the outcome in `cache`.
pub async fn load_into_cache(reader: &ReaderClient, cache: &ContentCache, url: &str) {
    cache.insert(url, ContentState::Loading);
    match reader.fetch(url).await {
        Ok(content) => {
            tracing::debug!(url = %url, len = content.len(), "Reader content cached");
            cache.insert(url, ContentState::Ready(Arc::from(content)));
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Reader content fetch failed");
            cache.insert(url, ContentState::Failed(e.to_string()));
        }
    }
}

//! Background prefetch of reader content for the current digest's stories.
//!
//! `PrefetchManager` owns the bookkeeping (which hints it installed, dedup,
//! validation); a `PrefetchSink` does the actual work. Every `update`
//! replaces the previous cycle's hints.

use std::collections::{HashMap, HashSet};
use tokio::task::JoinHandle;
use url::Url;

use crate::content::{cache_key, load_into_cache, ContentCache, ReaderClient};
use crate::util::validate_url;

/// Installs and removes individual hints.
pub trait PrefetchSink {
    fn install(&mut self, url: &Url);
    fn remove(&mut self, url: &str);
}

impl<S: PrefetchSink + ?Sized> PrefetchSink for Box<S> {
    fn install(&mut self, url: &Url) {
        (**self).install(url);
    }

    fn remove(&mut self, url: &str) {
        (**self).remove(url);
    }
}

/// Tracks the hints installed by the most recent `update`.
pub struct PrefetchManager<S: PrefetchSink> {
    sink: S,
    installed: Vec<String>,
}

impl<S: PrefetchSink> PrefetchManager<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            installed: Vec::new(),
        }
    }

    /// Replace all hints with one per unique, valid URL in `urls`.
    ///
    /// Invalid URLs are logged and skipped. Returns the number installed.
    pub fn update<'a, I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        for old in self.installed.drain(..) {
            self.sink.remove(&old);
        }

        let mut seen = HashSet::new();
        for url in urls {
            if url.is_empty() || !seen.insert(url) {
                continue;
            }
            match validate_url(url) {
                Ok(parsed) => {
                    self.sink.install(&parsed);
                    self.installed.push(url.to_string());
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping prefetch for invalid URL");
                }
            }
        }

        tracing::debug!(installed = self.installed.len(), "Prefetch hints updated");
        self.installed.len()
    }

    /// Remove every hint without installing new ones.
    pub fn clear(&mut self) {
        self.update(std::iter::empty());
    }

    pub fn installed(&self) -> &[String] {
        &self.installed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

// ============================================================================
// Reader Content Sink
// ============================================================================

/// Spawns one reader fetch per hint into the shared content cache.
pub struct ContentPrefetcher {
    reader: ReaderClient,
    cache: ContentCache,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl ContentPrefetcher {
    pub fn new(reader: ReaderClient, cache: ContentCache) -> Self {
        Self {
            reader,
            cache,
            tasks: HashMap::new(),
        }
    }
}

impl PrefetchSink for ContentPrefetcher {
    fn install(&mut self, url: &Url) {
        // Normalised form, matching `cache_key`
        let key = url.as_str().to_string();
        // Distinct raw strings can normalise to the same key
        let in_flight = self.tasks.get(&key).is_some_and(|h| !h.is_finished());
        if in_flight || self.cache.is_settled_or_loading(&key) {
            return;
        }
        let reader = self.reader.clone();
        let cache = self.cache.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            load_into_cache(&reader, &cache, &task_key).await;
        });
        self.tasks.insert(key, handle);
    }

    fn remove(&mut self, url: &str) {
        let key = cache_key(url);
        if let Some(handle) = self.tasks.remove(&key) {
            if !handle.is_finished() {
                handle.abort();
                self.cache.discard_loading(&key);
            }
        }
    }
}

impl Drop for ContentPrefetcher {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records sink calls in order.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl PrefetchSink for RecordingSink {
        fn install(&mut self, url: &Url) {
            self.calls.push(format!("install {}", url));
        }

        fn remove(&mut self, url: &str) {
            self.calls.push(format!("remove {}", url));
        }
    }

    #[test]
    fn test_dedups_preserving_first_occurrence() {
        let mut manager = PrefetchManager::new(RecordingSink::default());
        let count = manager.update([
            "https://b.example/",
            "https://a.example/",
            "https://b.example/",
            "",
        ]);
        assert_eq!(count, 2);
        assert_eq!(
            manager.sink().calls,
            vec!["install https://b.example/", "install https://a.example/"]
        );
    }

    #[test]
    fn test_invalid_urls_skipped() {
        let mut manager = PrefetchManager::new(RecordingSink::default());
        let count = manager.update([
            "not a url",
            "ftp://files.example/x",
            "http://192.168.0.10/",
            "https://ok.example/",
        ]);
        assert_eq!(count, 1);
        assert_eq!(manager.installed(), ["https://ok.example/".to_string()]);
    }

    #[test]
    fn test_previous_hints_removed_first() {
        let mut manager = PrefetchManager::new(RecordingSink::default());
        manager.update(["https://old.example/"]);
        manager.update(["https://new.example/"]);
        assert_eq!(
            manager.sink().calls,
            vec![
                "install https://old.example/",
                "remove https://old.example/",
                "install https://new.example/",
            ]
        );
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut manager = PrefetchManager::new(RecordingSink::default());
        manager.update(["https://a.example/", "https://b.example/"]);
        manager.clear();
        assert!(manager.installed().is_empty());
        assert_eq!(manager.sink().calls.len(), 4);
    }

    #[test]
    fn test_empty_input_installs_nothing() {
        let mut manager = PrefetchManager::new(RecordingSink::default());
        assert_eq!(manager.update(Vec::<&str>::new()), 0);
        assert!(manager.sink().calls.is_empty());
    }

    #[tokio::test]
    async fn test_content_prefetcher_skips_cached_urls() {
        let cache = ContentCache::new(8);
        cache.insert(
            "https://a.example/",
            crate::content::ContentState::Ready(std::sync::Arc::from("cached")),
        );
        let reader = ReaderClient::new(reqwest::Client::new(), None);
        let mut sink = ContentPrefetcher::new(reader, cache.clone());
        sink.install(&Url::parse("https://a.example/").unwrap());
        assert!(sink.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_content_prefetcher_spawns_once_per_normalised_url() {
        let reader = ReaderClient::new(reqwest::Client::new(), None);
        let mut sink = ContentPrefetcher::new(reader, ContentCache::new(8));
        sink.install(&validate_url("https://a.example").unwrap());
        sink.install(&validate_url("https://a.example/").unwrap());
        assert_eq!(sink.tasks.len(), 1);

        sink.remove("https://a.example");
        assert!(sink.tasks.is_empty());
    }

    #[test]
    fn test_boxed_sink_forwards_calls() {
        let mut manager: PrefetchManager<Box<dyn PrefetchSink + Send>> =
            PrefetchManager::new(Box::new(RecordingSink::default()));
        assert_eq!(manager.update(["https://a.example/", "https://a.example/"]), 1);
        manager.clear();
        assert!(manager.installed().is_empty());
    }
}

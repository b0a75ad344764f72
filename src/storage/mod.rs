//! Persistence for the two app keys: `theme` and `savedNewsStories`.
//!
//! `KeyValueStore` is the seam the digest controller writes through.
//! `Database` backs it with SQLite; `MemoryStore` is an in-process fake.

mod local_store;
mod schema;
mod types;

pub use schema::Database;
pub use types::DatabaseError;

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Key for the persisted theme (`"light"` or `"dark"`).
pub const THEME_KEY: &str = "theme";
/// Key for the JSON array of saved stories.
pub const SAVED_STORIES_KEY: &str = "savedNewsStories";

/// String key/value persistence.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        self.get_value(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        self.set_value(key, value)
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail, to exercise write-failure paths.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    /// Synchronous read for assertions.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.values.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let result = self
            .inner
            .lock()
            .map(|inner| inner.values.get(key).cloned())
            .map_err(|_| anyhow::anyhow!("memory store poisoned"));
        async move { result }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        let result = match self.inner.lock() {
            Ok(inner) if inner.fail_writes => Err(anyhow::anyhow!("write rejected")),
            Ok(mut inner) => {
                inner.values.insert(key.to_string(), value.to_string());
                Ok(())
            }
            Err(_) => Err(anyhow::anyhow!("memory store poisoned")),
        };
        async move { result }
    }
}

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde_json::Value;

use super::KeyValueCache;

/// Default number of entries the in-memory cache holds before evicting.
///
/// A quad-tree query at depth 4 can populate up to 341 entries (the full
/// subtree plus ancestors), so the default keeps a few hundred subtrees
/// resident.
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

/// In-memory LRU implementation of [`KeyValueCache`].
///
/// Entries never expire; they only leave the cache through LRU eviction.
/// The mutex guards short critical sections only (no awaits while held).
pub struct InMemoryCache {
    entries: Mutex<LruCache<String, Value>>,
}

impl InMemoryCache {
    /// Create a cache with [`DEFAULT_CACHE_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache bounded to `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("cache capacity must be non-zero"),
            )),
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.put(key.to_string(), value);
                true
            }
            Err(_) => false,
        }
    }
}

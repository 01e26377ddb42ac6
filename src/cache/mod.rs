//! Pluggable key/value cache.
//!
//! All client objects constructed from one [`crate::CatalogSettings`] share
//! a single injected cache. The cache maps composite string keys to opaque
//! JSON values; key construction is pure and lives here so the exact wire
//! format stays independently testable.
//!
//! The default implementation is a process-scoped in-memory LRU map with no
//! cross-entry consistency: repeated resolutions of the same key overwrite
//! (last write wins).

mod memory;

pub use memory::{InMemoryCache, DEFAULT_CACHE_CAPACITY};

use serde_json::Value;

/// A process-scoped store shared by every client built from one settings
/// object.
///
/// Implementations must be safe to call from concurrent tasks; the default
/// [`InMemoryCache`] serializes access with a plain mutex, which is enough
/// for a single-consumer cooperative scheduler.
pub trait KeyValueCache: Send + Sync {
    /// Look up a value. Returns `None` on a miss.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value under a key, overwriting any previous entry. Returns
    /// `false` if the value could not be stored.
    fn put(&self, key: &str, value: Value) -> bool;
}

/// Cache key for one partition's metadata record.
///
/// The format is shared with other consumers of the same store and must be
/// reproduced exactly: `"<catalogHRN>::<layerId>::<version>::<partitionOrQuadKey>::partition"`.
/// Versionless (volatile) layers leave the version slot empty.
pub fn partition_cache_key(
    catalog_hrn: &str,
    layer_id: &str,
    version: Option<u64>,
    partition_id: &str,
) -> String {
    match version {
        Some(v) => format!("{catalog_hrn}::{layer_id}::{v}::{partition_id}::partition"),
        None => format!("{catalog_hrn}::{layer_id}::::{partition_id}::partition"),
    }
}

/// Cache key for a resolved endpoint descriptor.
pub fn api_cache_key(catalog_hrn: &str, api: &str, api_version: &str) -> String {
    format!("{catalog_hrn}::{api}::{api_version}::api")
}

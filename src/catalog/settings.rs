use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::cache::{api_cache_key, InMemoryCache, KeyValueCache};
use crate::error::CatalogError;
use crate::model::Api;
use crate::transport::LookupApi;

/// Shared, process-wide state for all clients of one catalog.
///
/// Every client constructed from the same settings object shares the same
/// key/value cache and the same resolved-endpoint entries. Endpoint cache
/// entries never expire within the settings object's lifetime; dropping the
/// settings (and the cache with it) is the only way to forget them.
pub struct CatalogSettings {
    catalog_hrn: String,
    cache: Arc<dyn KeyValueCache>,
    lookup: Arc<dyn LookupApi>,
}

impl CatalogSettings {
    /// Create settings with the default in-memory cache.
    pub fn new(catalog_hrn: impl Into<String>, lookup: Arc<dyn LookupApi>) -> Self {
        Self::with_cache(catalog_hrn, lookup, Arc::new(InMemoryCache::new()))
    }

    /// Create settings with an injected cache implementation.
    pub fn with_cache(
        catalog_hrn: impl Into<String>,
        lookup: Arc<dyn LookupApi>,
        cache: Arc<dyn KeyValueCache>,
    ) -> Self {
        Self {
            catalog_hrn: catalog_hrn.into(),
            cache,
            lookup,
        }
    }

    /// The catalog this settings object is scoped to.
    pub fn catalog_hrn(&self) -> &str {
        &self.catalog_hrn
    }

    /// The shared key/value cache.
    pub fn cache(&self) -> Arc<dyn KeyValueCache> {
        self.cache.clone()
    }

    /// Resolve the base URL serving `(api, api_version)` for this catalog.
    ///
    /// Checks the shared cache first; on a miss, issues one discovery call,
    /// stores every descriptor it returns, and answers from those. Fails
    /// with [`CatalogError::MissingEndpoint`] when the requested api/version
    /// pair is absent from the discovery response.
    pub async fn resolve_endpoint(
        &self,
        api: &str,
        api_version: &str,
    ) -> Result<String, CatalogError> {
        let key = api_cache_key(&self.catalog_hrn, api, api_version);
        if let Some(value) = self.cache.get(&key) {
            if let Ok(descriptor) = serde_json::from_value::<Api>(value) {
                return Ok(descriptor.base_url);
            }
        }

        debug!(catalog = %self.catalog_hrn, api, api_version, "endpoint cache miss, running discovery");
        let descriptors = self.lookup.lookup(&self.catalog_hrn).await?;

        let mut resolved = None;
        for descriptor in descriptors {
            let entry_key = api_cache_key(&self.catalog_hrn, &descriptor.api, &descriptor.version);
            self.cache.put(&entry_key, json!(descriptor));
            if descriptor.api == api && descriptor.version == api_version {
                resolved = Some(descriptor.base_url);
            }
        }

        resolved.ok_or_else(|| CatalogError::MissingEndpoint {
            api: api.to_string(),
            version: api_version.to_string(),
        })
    }
}

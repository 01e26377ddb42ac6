use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::cache::{partition_cache_key, KeyValueCache};
use crate::error::CatalogError;
use crate::geo::QuadKey;
use crate::model::Partition;
use crate::transport::QueryApi;

/// Default depth of a quad-tree subtree query. One query at depth 4 covers
/// up to 4^4 = 256 tiles at the target level, so later requests for nearby
/// tiles are answered from cache.
pub const DEFAULT_QUERY_DEPTH: u32 = 4;

/// Turns a tile or partition identifier into a concrete metadata record
/// while minimizing network round trips.
///
/// For quad-tree requests the engine queries a whole subtree at once and
/// populates the shared cache at two granularities: every returned subtree
/// tile under its absolute id, and every coarser ancestor (which stands in
/// for its uncovered descendants) under its own id. The original request is
/// then answered by exact match or by walking ancestors from the query root
/// up to the root tile.
///
/// Concurrent engines resolving overlapping subtrees are NOT deduplicated:
/// each issues its own query and both write the cache, last write wins.
pub struct ResolutionEngine {
    catalog_hrn: String,
    layer_id: String,
    cache: Arc<dyn KeyValueCache>,
    query: Arc<dyn QueryApi>,
    depth: u32,
}

impl ResolutionEngine {
    /// Create an engine with the default query depth.
    pub fn new(
        catalog_hrn: impl Into<String>,
        layer_id: impl Into<String>,
        cache: Arc<dyn KeyValueCache>,
        query: Arc<dyn QueryApi>,
    ) -> Self {
        Self {
            catalog_hrn: catalog_hrn.into(),
            layer_id: layer_id.into(),
            cache,
            query,
            depth: DEFAULT_QUERY_DEPTH,
        }
    }

    /// Override the subtree query depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Resolve one tile to its metadata record.
    ///
    /// Answers from cache when the tile (or a standing-in ancestor) was
    /// populated by an earlier query; otherwise issues exactly one subtree
    /// query rooted `depth` levels above the target (clamped at level 0),
    /// stores everything it returns, and answers from that.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when neither the tile nor any ancestor up
    /// to level 0 carries data; the error names the originally requested
    /// partition id.
    pub async fn resolve_tile(
        &self,
        base_url: &str,
        target: QuadKey,
        version: Option<u64>,
    ) -> Result<Partition, CatalogError> {
        let delta = self.depth.min(target.level);
        let root = target.ancestor(delta);

        if let Some(record) = self.lookup_tile(version, &target, &root) {
            debug!(tile = %target, partition = %record.partition, "tile resolved from cache");
            return Ok(record);
        }

        let root_id = root.to_partition_id();
        debug!(tile = %target, root = %root_id, depth = delta, "quad tree query");
        let index = self
            .query
            .get_quad_tree_index(base_url, &self.layer_id, version, &root_id, delta)
            .await?;

        for sub in &index.sub_quads {
            let Ok(code) = sub.sub_quad_key.parse::<u64>() else {
                warn!(sub_quad_key = %sub.sub_quad_key, "skipping malformed subQuadKey");
                continue;
            };
            let absolute = root.add(&QuadKey::from_morton_code(code));
            let record = Partition::new(absolute.to_partition_id(), sub.version, &sub.data_handle);
            self.store(version, &record);
        }
        for parent in &index.parent_quads {
            let record = Partition::new(&parent.partition, parent.version, &parent.data_handle);
            self.store(version, &record);
        }

        self.lookup_tile(version, &target, &root)
            .ok_or_else(|| CatalogError::NotFound(target.to_partition_id()))
    }

    /// Resolve explicit partition ids, bypassing the quad-tree walk.
    ///
    /// Ids already cached are answered locally; the remainder go out as one
    /// batched query. Ids the service does not know are simply absent from
    /// the result (not an error).
    pub async fn resolve_partitions(
        &self,
        base_url: &str,
        partition_ids: &[String],
        version: Option<u64>,
    ) -> Result<Vec<Partition>, CatalogError> {
        let mut found: HashMap<String, Partition> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();

        for id in partition_ids {
            match self.cached(version, id) {
                Some(record) => {
                    found.insert(id.clone(), record);
                }
                None => missing.push(id.clone()),
            }
        }

        if !missing.is_empty() {
            debug!(
                requested = partition_ids.len(),
                fetching = missing.len(),
                "partition query"
            );
            let response = self
                .query
                .get_partitions_by_id(base_url, &self.layer_id, &missing, version)
                .await?;
            for record in response.partitions {
                self.store(version, &record);
                found.insert(record.partition.clone(), record);
            }
        }

        Ok(partition_ids
            .iter()
            .filter_map(|id| found.get(id).cloned())
            .collect())
    }

    /// Exact match, then the ancestor walk: query root first, then each
    /// coarser ancestor up to level 0. The first hit is the closest
    /// ancestor standing in for the target.
    fn lookup_tile(
        &self,
        version: Option<u64>,
        target: &QuadKey,
        root: &QuadKey,
    ) -> Option<Partition> {
        if let Some(record) = self.cached(version, &target.to_partition_id()) {
            return Some(record);
        }
        let mut current = *root;
        loop {
            if current != *target {
                if let Some(record) = self.cached(version, &current.to_partition_id()) {
                    return Some(record);
                }
            }
            current = current.parent()?;
        }
    }

    fn cached(&self, version: Option<u64>, partition_id: &str) -> Option<Partition> {
        let key = partition_cache_key(&self.catalog_hrn, &self.layer_id, version, partition_id);
        let value = self.cache.get(&key)?;
        serde_json::from_value(value).ok()
    }

    fn store(&self, version: Option<u64>, record: &Partition) {
        let key = partition_cache_key(
            &self.catalog_hrn,
            &self.layer_id,
            version,
            &record.partition,
        );
        self.cache.put(&key, json!(record));
    }
}

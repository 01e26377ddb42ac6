use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::catalog::{apis, CatalogSettings, ResolutionEngine, VersionLock};
use crate::error::{CatalogError, UploadError};
use crate::geo::QuadKey;
use crate::model::{LayerKind, Partition};
use crate::transport::{BlobApi, ObjectStoreApi, QueryApi};
use crate::upload::{
    BlobV1Backend, MultipartUploader, ObjectStoreV2Backend, UploadOptions, UploadSource,
};

// =============================================================================
// Versioned layers
// =============================================================================

/// Client for a versioned layer: metadata resolution pinned to a catalog
/// version, payloads served by the blob (v1) service.
pub struct VersionedLayerClient {
    settings: Arc<CatalogSettings>,
    layer_id: String,
    query: Arc<dyn QueryApi>,
    blob: Arc<dyn BlobApi>,
    engine: ResolutionEngine,
    versions: VersionLock,
}

impl VersionedLayerClient {
    /// Create a client that resolves the latest catalog version on first
    /// unversioned use and locks it for its lifetime.
    pub fn new(
        settings: Arc<CatalogSettings>,
        layer_id: impl Into<String>,
        query: Arc<dyn QueryApi>,
        blob: Arc<dyn BlobApi>,
    ) -> Self {
        Self::build(settings, layer_id.into(), query, blob, VersionLock::new())
    }

    /// Create a client pinned to a specific catalog version.
    pub fn with_locked_version(
        settings: Arc<CatalogSettings>,
        layer_id: impl Into<String>,
        query: Arc<dyn QueryApi>,
        blob: Arc<dyn BlobApi>,
        version: u64,
    ) -> Self {
        Self::build(
            settings,
            layer_id.into(),
            query,
            blob,
            VersionLock::with_version(version),
        )
    }

    fn build(
        settings: Arc<CatalogSettings>,
        layer_id: String,
        query: Arc<dyn QueryApi>,
        blob: Arc<dyn BlobApi>,
        versions: VersionLock,
    ) -> Self {
        let engine = ResolutionEngine::new(
            settings.catalog_hrn(),
            layer_id.clone(),
            settings.cache(),
            query.clone(),
        );
        Self {
            settings,
            layer_id,
            query,
            blob,
            engine,
            versions,
        }
    }

    /// Override the quad-tree query depth.
    pub fn with_query_depth(mut self, depth: u32) -> Self {
        self.engine = self.engine.with_depth(depth);
        self
    }

    /// The layer this client is scoped to.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// The catalog version that applies to `explicit`, per the resolution
    /// policy (explicit, else locked, else resolve-and-lock the latest).
    pub async fn resolve_version(&self, explicit: Option<u64>) -> Result<u64, CatalogError> {
        self.versions
            .resolve(explicit, || async move {
                let base = self
                    .settings
                    .resolve_endpoint(apis::METADATA.0, apis::METADATA.1)
                    .await?;
                let response = self.query.get_latest_version(&base, -1).await?;
                Ok(response.version)
            })
            .await
    }

    /// Resolve one tile to its metadata record, with ancestor fallback.
    pub async fn get_tile(
        &self,
        tile: QuadKey,
        version: Option<u64>,
    ) -> Result<Partition, CatalogError> {
        let version = self.resolve_version(version).await?;
        let base = self
            .settings
            .resolve_endpoint(apis::QUERY.0, apis::QUERY.1)
            .await?;
        self.engine.resolve_tile(&base, tile, Some(version)).await
    }

    /// Resolve one explicit partition id. Ids unknown to the catalog return
    /// `Ok(None)`.
    pub async fn get_partition(
        &self,
        partition_id: &str,
        version: Option<u64>,
    ) -> Result<Option<Partition>, CatalogError> {
        let ids = [partition_id.to_string()];
        let records = self.get_partitions(&ids, version).await?;
        Ok(records.into_iter().next())
    }

    /// Resolve a batch of explicit partition ids in one query. Unknown ids
    /// are absent from the result.
    pub async fn get_partitions(
        &self,
        partition_ids: &[String],
        version: Option<u64>,
    ) -> Result<Vec<Partition>, CatalogError> {
        let version = self.resolve_version(version).await?;
        let base = self
            .settings
            .resolve_endpoint(apis::QUERY.0, apis::QUERY.1)
            .await?;
        self.engine
            .resolve_partitions(&base, partition_ids, Some(version))
            .await
    }

    /// Fetch the bytes behind a resolved data handle.
    pub async fn get_data(&self, data_handle: &str) -> Result<Bytes, CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::BLOB.0, apis::BLOB.1)
            .await?;
        debug!(layer = %self.layer_id, data_handle, "fetching blob");
        Ok(self.blob.get_blob(&base, &self.layer_id, data_handle).await?)
    }

    /// Aggregated fetch: resolve the tile (including ancestor fallback) and
    /// fetch the resulting handle, so callers never special-case the
    /// coarser-ancestor outcome.
    pub async fn get_tile_data(
        &self,
        tile: QuadKey,
        version: Option<u64>,
    ) -> Result<Bytes, CatalogError> {
        let record = self.get_tile(tile, version).await?;
        self.get_data(&record.data_handle).await
    }

    /// Store a single-shot payload under a data handle.
    pub async fn put_data(
        &self,
        data_handle: &str,
        content_type: &str,
        body: Bytes,
        billing_tag: Option<&str>,
    ) -> Result<(), CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::BLOB.0, apis::BLOB.1)
            .await?;
        Ok(self
            .blob
            .put_blob(&base, &self.layer_id, data_handle, content_type, body, billing_tag)
            .await?)
    }

    /// Whether a data handle exists in the blob store.
    pub async fn data_exists(&self, data_handle: &str) -> Result<bool, CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::BLOB.0, apis::BLOB.1)
            .await?;
        Ok(self
            .blob
            .blob_exists(&base, &self.layer_id, data_handle)
            .await?)
    }

    /// Delete the bytes behind a data handle.
    pub async fn delete_data(&self, data_handle: &str) -> Result<(), CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::BLOB.0, apis::BLOB.1)
            .await?;
        Ok(self
            .blob
            .delete_blob(&base, &self.layer_id, data_handle)
            .await?)
    }

    /// Upload a large payload to `data_handle` as a chunked multipart
    /// session over the blob (v1) service.
    ///
    /// Returns the completion call's status code. Callers that want
    /// progress notifications drive a [`MultipartUploader`] directly.
    pub async fn upload_data(
        &self,
        data_handle: &str,
        source: &dyn UploadSource,
        options: UploadOptions,
    ) -> Result<u16, UploadError> {
        let base = self
            .settings
            .resolve_endpoint(apis::BLOB.0, apis::BLOB.1)
            .await
            .map_err(UploadError::Endpoint)?;
        let backend = Arc::new(BlobV1Backend::new(
            self.blob.clone(),
            base,
            self.layer_id.clone(),
            data_handle,
            options.content_type.clone(),
            options.content_encoding.clone(),
            options.billing_tag.clone(),
        ));
        MultipartUploader::new(backend)
            .with_options(options)
            .upload(source)
            .await
    }
}

// =============================================================================
// Volatile layers
// =============================================================================

/// Client for a volatile layer: unversioned metadata, payloads served by
/// the object-store (v2) service.
pub struct VolatileLayerClient {
    settings: Arc<CatalogSettings>,
    layer_id: String,
    object_store: Arc<dyn ObjectStoreApi>,
    engine: ResolutionEngine,
}

impl VolatileLayerClient {
    pub fn new(
        settings: Arc<CatalogSettings>,
        layer_id: impl Into<String>,
        query: Arc<dyn QueryApi>,
        object_store: Arc<dyn ObjectStoreApi>,
    ) -> Self {
        let layer_id = layer_id.into();
        let engine = ResolutionEngine::new(
            settings.catalog_hrn(),
            layer_id.clone(),
            settings.cache(),
            query,
        );
        Self {
            settings,
            layer_id,
            object_store,
            engine,
        }
    }

    /// Override the quad-tree query depth.
    pub fn with_query_depth(mut self, depth: u32) -> Self {
        self.engine = self.engine.with_depth(depth);
        self
    }

    /// The layer this client is scoped to.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Resolve one tile to its metadata record, with ancestor fallback.
    /// Volatile quad-tree queries carry no catalog version.
    pub async fn get_tile(&self, tile: QuadKey) -> Result<Partition, CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::QUERY.0, apis::QUERY.1)
            .await?;
        self.engine.resolve_tile(&base, tile, None).await
    }

    /// Resolve explicit partition ids in one query.
    pub async fn get_partitions(
        &self,
        partition_ids: &[String],
    ) -> Result<Vec<Partition>, CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::QUERY.0, apis::QUERY.1)
            .await?;
        self.engine
            .resolve_partitions(&base, partition_ids, None)
            .await
    }

    /// Fetch the bytes behind a resolved data handle.
    pub async fn get_data(&self, data_handle: &str) -> Result<Bytes, CatalogError> {
        let base = self
            .settings
            .resolve_endpoint(apis::OBJECT_STORE.0, apis::OBJECT_STORE.1)
            .await?;
        debug!(layer = %self.layer_id, data_handle, "fetching object");
        Ok(self
            .object_store
            .get_object(&base, &self.layer_id, data_handle)
            .await?)
    }

    /// Aggregated fetch: tile resolution composed with the data fetch.
    pub async fn get_tile_data(&self, tile: QuadKey) -> Result<Bytes, CatalogError> {
        let record = self.get_tile(tile).await?;
        self.get_data(&record.data_handle).await
    }

    /// Upload a large payload under `key` as a chunked multipart session
    /// over the object-store (v2) service.
    pub async fn upload_data(
        &self,
        key: &str,
        source: &dyn UploadSource,
        options: UploadOptions,
    ) -> Result<u16, UploadError> {
        let base = self
            .settings
            .resolve_endpoint(apis::OBJECT_STORE.0, apis::OBJECT_STORE.1)
            .await
            .map_err(UploadError::Endpoint)?;
        let backend = Arc::new(ObjectStoreV2Backend::new(
            self.object_store.clone(),
            base,
            self.layer_id.clone(),
            key,
            options.content_type.clone(),
            options.content_encoding.clone(),
            options.billing_tag.clone(),
        ));
        MultipartUploader::new(backend)
            .with_options(options)
            .upload(source)
            .await
    }
}

// =============================================================================
// Kind dispatch
// =============================================================================

/// Layer client facade with the backend variant picked once, at
/// construction. Only versioned and volatile layers carry the metadata and
/// blob read path; any other kind fails here, before any network call.
pub enum LayerClient {
    Versioned(VersionedLayerClient),
    Volatile(VolatileLayerClient),
}

impl LayerClient {
    /// Build the client matching the layer kind.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Unsupported`] for stream, index, or any other layer
    /// kind.
    pub fn for_kind(
        kind: LayerKind,
        settings: Arc<CatalogSettings>,
        layer_id: impl Into<String>,
        query: Arc<dyn QueryApi>,
        blob: Arc<dyn BlobApi>,
        object_store: Arc<dyn ObjectStoreApi>,
    ) -> Result<Self, CatalogError> {
        match kind {
            LayerKind::Versioned => Ok(LayerClient::Versioned(VersionedLayerClient::new(
                settings, layer_id, query, blob,
            ))),
            LayerKind::Volatile => Ok(LayerClient::Volatile(VolatileLayerClient::new(
                settings,
                layer_id,
                query,
                object_store,
            ))),
            other => Err(CatalogError::Unsupported {
                operation: "tile and data access",
                kind: other.to_string(),
            }),
        }
    }

    /// The variant this client was built for.
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerClient::Versioned(_) => LayerKind::Versioned,
            LayerClient::Volatile(_) => LayerKind::Volatile,
        }
    }

    /// Resolve a tile against the layer's current version (locked/latest
    /// for versioned layers, unversioned for volatile ones).
    pub async fn get_tile(&self, tile: QuadKey) -> Result<Partition, CatalogError> {
        match self {
            LayerClient::Versioned(client) => client.get_tile(tile, None).await,
            LayerClient::Volatile(client) => client.get_tile(tile).await,
        }
    }

    /// Fetch the bytes behind a resolved data handle.
    pub async fn get_data(&self, data_handle: &str) -> Result<Bytes, CatalogError> {
        match self {
            LayerClient::Versioned(client) => client.get_data(data_handle).await,
            LayerClient::Volatile(client) => client.get_data(data_handle).await,
        }
    }

    /// Aggregated fetch: tile resolution composed with the data fetch.
    pub async fn get_tile_data(&self, tile: QuadKey) -> Result<Bytes, CatalogError> {
        match self {
            LayerClient::Versioned(client) => client.get_tile_data(tile, None).await,
            LayerClient::Volatile(client) => client.get_tile_data(tile).await,
        }
    }
}

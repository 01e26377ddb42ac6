//! # quadcatalog
//!
//! An async client for tile- and partition-organized geospatial catalogs.
//!
//! Callers request data by partition id, quad-tree tile key, or data
//! handle; the client resolves the request against cached catalog metadata
//! and fetches the payload through the blob transports. In the write
//! direction, large payloads are uploaded as chunked multipart sessions
//! with bounded concurrency.
//!
//! ## Features
//!
//! - **Subtree-amortized resolution**: one quad-tree query populates the
//!   cache for up to 4^depth descendant tiles, with coarser-ancestor
//!   fallback for tiles whose data is defined further up the tree
//! - **Version locking**: at most one latest-version lookup per client
//!   instance; explicit versions never trigger one
//! - **Pluggable caching**: a key/value cache injected at construction and
//!   shared by every client built from the same settings
//! - **Chunked uploads**: fixed-size parts, deterministic numbering,
//!   batched bounded concurrency, two multipart backend variants
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`geo`] - Quadkey arithmetic (Morton codes, parent/child navigation)
//! - [`cache`] - Key/value cache trait, in-memory default, cache-key format
//! - [`model`] - Typed records for collaborator responses and cache entries
//! - [`transport`] - Contracts for the REST collaborators (out of scope here)
//! - [`catalog`] - Settings, endpoint/version resolution, layer clients
//! - [`upload`] - Chunked multipart upload pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quadcatalog::{CatalogSettings, LayerClient, LayerKind, QuadKey};
//!
//! # async fn example(lookup: Arc<dyn quadcatalog::LookupApi>,
//! #                  query: Arc<dyn quadcatalog::QueryApi>,
//! #                  blob: Arc<dyn quadcatalog::BlobApi>,
//! #                  object_store: Arc<dyn quadcatalog::ObjectStoreApi>) {
//! let settings = Arc::new(CatalogSettings::new("hrn:here:data::olp-here:rib-2", lookup));
//! let layer = LayerClient::for_kind(
//!     LayerKind::Versioned, settings, "topology-geometry", query, blob, object_store,
//! ).unwrap();
//!
//! let tile = QuadKey::from_morton_code(73982);
//! let bytes = layer.get_tile_data(tile).await.unwrap();
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod error;
pub mod geo;
pub mod model;
pub mod transport;
pub mod upload;

// Re-export commonly used types
pub use cache::{api_cache_key, partition_cache_key, InMemoryCache, KeyValueCache};
pub use catalog::{
    apis, CatalogSettings, LayerClient, ResolutionEngine, VersionLock, VersionedLayerClient,
    VolatileLayerClient, DEFAULT_QUERY_DEPTH,
};
pub use error::{CatalogError, TransportError, UploadError};
pub use geo::{QuadKey, MAX_QUADKEY_LEVEL};
pub use model::{
    Api, LayerKind, ParentQuad, Partition, PartitionsResponse, QuadTreeIndex, SubQuad,
    VersionResponse,
};
pub use transport::{
    BlobApi, BlobPartResult, LookupApi, MultipartLinks, MultipartStartResponse,
    MultipartTokenResponse, ObjectPartResult, ObjectStoreApi, QueryApi, UploadPart,
};
pub use upload::{
    BlobV1Backend, BytesUploadSource, MultipartBackend, MultipartSession, MultipartUploader,
    NoopProgress, ObjectStoreV2Backend, PartUploaded, UploadOptions, UploadProgress, UploadSource,
    UploadStarted, DEFAULT_CHUNK_SIZE_MIB, DEFAULT_PARALLEL_REQUESTS, MAX_CHUNK_SIZE_MIB,
    MIN_CHUNK_SIZE_MIB,
};

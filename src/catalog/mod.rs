//! Catalog client objects.
//!
//! Everything here is glue around the shared primitives: a settings object
//! carrying process-wide mutable state (cache, discovery), a version
//! resolution policy, the tile/partition resolution engine, and per-layer
//! client facades.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    LayerClient                       │
//! │   (versioned / volatile variant, picked once)        │
//! │  ┌─────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │ VersionLock │ │ Resolution   │ │  Blob fetch  │   │
//! │  │             │ │ Engine       │ │  by handle   │   │
//! │  └─────────────┘ └──────────────┘ └──────────────┘   │
//! └───────────────┬──────────────────────────────────────┘
//!                 │
//!                 ▼
//! ┌──────────────────────────────────────────────────────┐
//! │   CatalogSettings (shared cache + endpoint lookup)   │
//! └──────────────────────────────────────────────────────┘
//! ```

mod layer;
mod resolve;
mod settings;
mod version;

pub use layer::{LayerClient, VersionedLayerClient, VolatileLayerClient};
pub use resolve::{ResolutionEngine, DEFAULT_QUERY_DEPTH};
pub use settings::CatalogSettings;
pub use version::VersionLock;

/// Well-known api identifiers used with endpoint resolution.
pub mod apis {
    /// Explicit-id and quad-tree partition queries.
    pub const QUERY: (&str, &str) = ("query", "v1");
    /// Latest-version and other catalog metadata.
    pub const METADATA: (&str, &str) = ("metadata", "v1");
    /// Blob service backing versioned layers.
    pub const BLOB: (&str, &str) = ("blob", "v1");
    /// Object-store service backing volatile layers.
    pub const OBJECT_STORE: (&str, &str) = ("objectstore", "v2");
}

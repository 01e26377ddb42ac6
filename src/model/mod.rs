//! Wire and cache record types.
//!
//! Collaborator responses are loosely-typed JSON; this module gives each
//! shape an explicit record with optional fields spelled out, so validation
//! happens once at the transport boundary instead of being trusted
//! downstream. The same records serialize into the shared key/value cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata for one stored partition: the link between a partition id and
/// the data handle used to fetch its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Application-level partition id, or the decimal Morton code for
    /// tile-partitioned layers.
    pub partition: String,

    /// Catalog version at which this partition last changed.
    pub version: i64,

    /// Opaque handle addressing the partition's bytes in the blob store.
    pub data_handle: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_data_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc: Option<String>,
}

impl Partition {
    /// Minimal record with just the required fields.
    pub fn new(
        partition: impl Into<String>,
        version: i64,
        data_handle: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            version,
            data_handle: data_handle.into(),
            checksum: None,
            data_size: None,
            compressed_data_size: None,
            crc: None,
        }
    }
}

/// Response of an explicit-ids partition query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionsResponse {
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

/// A tile strictly inside a queried subtree, addressed relative to the
/// query root by its own Morton code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuad {
    /// Morton code of this tile relative to the query root, in decimal.
    pub sub_quad_key: String,
    pub version: i64,
    pub data_handle: String,
}

/// An ancestor tile standing in for every uncovered descendant in the
/// queried subtree, addressed by its absolute partition id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuad {
    /// Absolute partition id (decimal Morton code).
    pub partition: String,
    pub version: i64,
    pub data_handle: String,
}

/// Response of a quad-tree subtree query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadTreeIndex {
    #[serde(default)]
    pub sub_quads: Vec<SubQuad>,
    #[serde(default)]
    pub parent_quads: Vec<ParentQuad>,
}

/// Response of the latest-version query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: u64,
}

/// One entry of a service-discovery response: where a given api/version
/// pair is served for a catalog scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub api: String,
    pub version: String,
    #[serde(rename = "baseURL")]
    pub base_url: String,
}

/// The kinds of layer a catalog can hold. Only versioned and volatile
/// layers support the metadata/blob read path of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Versioned,
    Volatile,
    Stream,
    Index,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Versioned => "versioned",
            LayerKind::Volatile => "volatile",
            LayerKind::Stream => "stream",
            LayerKind::Index => "index",
        };
        f.write_str(name)
    }
}

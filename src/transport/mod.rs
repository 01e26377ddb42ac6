//! Collaborator transport contracts.
//!
//! The REST surface itself (URL construction, HTTP execution, token
//! injection) lives outside this crate; these traits describe exactly what
//! the core consumes, one method per HTTP operation. Multipart responses
//! are kept loosely typed (`Option` fields) on purpose: the upload backends
//! validate them and turn missing fields into upload-integrity errors.
//!
//! Two blob-side services exist and are not interchangeable:
//!
//! - [`BlobApi`] (v1): serves versioned layers; multipart sessions are
//!   driven through URLs returned at start, and a part's identity is the
//!   `ETag` response header.
//! - [`ObjectStoreApi`] (v2): serves volatile layers; multipart sessions
//!   are driven through an opaque token, and a part's identity is an `id`
//!   field in the response body.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::model::{Api, PartitionsResponse, QuadTreeIndex, VersionResponse};

// =============================================================================
// Discovery
// =============================================================================

/// Service discovery: resolves which base URL serves each api/version pair
/// of a catalog scope.
#[async_trait]
pub trait LookupApi: Send + Sync {
    /// One discovery call for the catalog scope, returning every endpoint
    /// descriptor the platform serves for it.
    async fn lookup(&self, catalog_hrn: &str) -> Result<Vec<Api>, TransportError>;
}

// =============================================================================
// Metadata / query
// =============================================================================

/// Metadata queries against a catalog layer.
#[async_trait]
pub trait QueryApi: Send + Sync {
    /// `GET .../partitions?partition=<id>&partition=<id>&version=<v>`
    ///
    /// Ids absent from the result set are simply missing, not an error.
    async fn get_partitions_by_id(
        &self,
        base_url: &str,
        layer_id: &str,
        partition_ids: &[String],
        version: Option<u64>,
    ) -> Result<PartitionsResponse, TransportError>;

    /// `GET .../versions/<v>/quadkeys/<root>/depths/<d>`
    ///
    /// Volatile layers omit the `/versions/<v>` segment; that is signalled
    /// by `version == None`.
    async fn get_quad_tree_index(
        &self,
        base_url: &str,
        layer_id: &str,
        version: Option<u64>,
        root_partition_id: &str,
        depth: u32,
    ) -> Result<QuadTreeIndex, TransportError>;

    /// `GET .../versions/latest?startVersion=<v>`
    async fn get_latest_version(
        &self,
        base_url: &str,
        start_version: i64,
    ) -> Result<VersionResponse, TransportError>;
}

// =============================================================================
// Blob v1 (versioned layers)
// =============================================================================

/// One identified part of a multipart session, as submitted at completion.
/// The server orders parts by `number`; the submission order of the list
/// does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPart {
    pub number: u32,
    /// Opaque identity token for the uploaded part (ETag or body id,
    /// depending on the backend variant).
    pub id: String,
}

/// Raw v1 multipart start response: `{links: {uploadPart, complete, status}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartLinks {
    pub upload_part: Option<String>,
    pub complete: Option<String>,
    pub status: Option<String>,
}

/// Envelope of the v1 start response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartStartResponse {
    pub links: Option<MultipartLinks>,
}

/// Raw v1 part-upload result: the `ETag` response header, when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobPartResult {
    pub etag: Option<String>,
}

/// Blob service used by versioned layers.
#[async_trait]
pub trait BlobApi: Send + Sync {
    /// `GET .../data/<dataHandle>`
    async fn get_blob(
        &self,
        base_url: &str,
        layer_id: &str,
        data_handle: &str,
    ) -> Result<Bytes, TransportError>;

    /// `PUT .../data/<dataHandle>` for single-shot payloads.
    async fn put_blob(
        &self,
        base_url: &str,
        layer_id: &str,
        data_handle: &str,
        content_type: &str,
        body: Bytes,
        billing_tag: Option<&str>,
    ) -> Result<(), TransportError>;

    /// `HEAD .../data/<dataHandle>`; `Ok(true)` when the handle exists.
    async fn blob_exists(
        &self,
        base_url: &str,
        layer_id: &str,
        data_handle: &str,
    ) -> Result<bool, TransportError>;

    /// `DELETE .../data/<dataHandle>`
    async fn delete_blob(
        &self,
        base_url: &str,
        layer_id: &str,
        data_handle: &str,
    ) -> Result<(), TransportError>;

    /// `POST .../data/<dataHandle>/multiparts`
    async fn start_multipart(
        &self,
        base_url: &str,
        layer_id: &str,
        data_handle: &str,
        content_type: &str,
        content_encoding: Option<&str>,
        billing_tag: Option<&str>,
    ) -> Result<MultipartStartResponse, TransportError>;

    /// `POST <uploadPart-url>?partNumber=<n>` with the chunk bytes as body.
    async fn upload_part(
        &self,
        upload_part_url: &str,
        part_number: u32,
        body: Bytes,
        content_type: &str,
        billing_tag: Option<&str>,
    ) -> Result<BlobPartResult, TransportError>;

    /// `PUT <complete-url>` with the full parts list. Returns the response
    /// status code.
    async fn complete_multipart(
        &self,
        complete_url: &str,
        parts: &[UploadPart],
        billing_tag: Option<&str>,
    ) -> Result<u16, TransportError>;
}

// =============================================================================
// Object store v2 (volatile layers)
// =============================================================================

/// Raw v2 multipart start response: `{multipartToken}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartTokenResponse {
    pub multipart_token: Option<String>,
}

/// Raw v2 part-upload result: the `id` field of the response body, when
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPartResult {
    pub id: Option<String>,
}

/// Object-store service used by volatile layers.
#[async_trait]
pub trait ObjectStoreApi: Send + Sync {
    /// `GET .../keys/<key>`
    async fn get_object(
        &self,
        base_url: &str,
        layer_id: &str,
        key: &str,
    ) -> Result<Bytes, TransportError>;

    /// `PUT .../keys/<key>` for single-shot payloads.
    async fn put_object(
        &self,
        base_url: &str,
        layer_id: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
        billing_tag: Option<&str>,
    ) -> Result<(), TransportError>;

    /// `HEAD .../keys/<key>`; `Ok(true)` when the key exists.
    async fn object_exists(
        &self,
        base_url: &str,
        layer_id: &str,
        key: &str,
    ) -> Result<bool, TransportError>;

    /// `DELETE .../keys/<key>`
    async fn delete_object(
        &self,
        base_url: &str,
        layer_id: &str,
        key: &str,
    ) -> Result<(), TransportError>;

    /// `POST .../keys/<key>` opening a multipart session.
    async fn start_multipart(
        &self,
        base_url: &str,
        layer_id: &str,
        key: &str,
        content_type: &str,
        content_encoding: Option<&str>,
        billing_tag: Option<&str>,
    ) -> Result<MultipartTokenResponse, TransportError>;

    /// `POST .../keysMultipart/<token>/parts?partNumber=<n>` with the chunk
    /// bytes as body.
    async fn upload_part(
        &self,
        base_url: &str,
        layer_id: &str,
        multipart_token: &str,
        part_number: u32,
        body: Bytes,
        content_type: &str,
    ) -> Result<ObjectPartResult, TransportError>;

    /// `PUT .../keysMultipart/<token>` with the full parts list. Returns
    /// the response status code.
    async fn complete_multipart(
        &self,
        base_url: &str,
        layer_id: &str,
        multipart_token: &str,
        parts: &[UploadPart],
    ) -> Result<u16, TransportError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UploadError;
use crate::transport::{BlobApi, ObjectStoreApi, UploadPart};

/// One multipart capability: start a session, upload identified parts,
/// complete. The backend variant is chosen once at construction; the
/// pipeline never branches on it again.
#[async_trait]
pub trait MultipartBackend: Send + Sync {
    /// Open a multipart session. Every protocol field the variant requires
    /// is validated here, so a malformed start response aborts before any
    /// part is uploaded.
    async fn start(&self) -> Result<Box<dyn MultipartSession>, UploadError>;
}

/// A started multipart session.
#[async_trait]
pub trait MultipartSession: Send + Sync {
    /// Identifier of this session for logging and the start notification
    /// (the part-upload URL for v1, the multipart token for v2).
    fn id(&self) -> &str;

    /// Upload one numbered part and return its identity.
    async fn upload_part(&self, number: u32, body: Bytes) -> Result<UploadPart, UploadError>;

    /// Submit the full parts list. Order does not matter; the server uses
    /// the embedded part numbers. Returns the response status code.
    async fn complete(&self, parts: Vec<UploadPart>) -> Result<u16, UploadError>;
}

impl std::fmt::Debug for dyn MultipartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartSession")
            .field("id", &self.id())
            .finish()
    }
}

// =============================================================================
// Variant 1: blob service
// =============================================================================

/// Multipart backend over the blob (v1) service, used by versioned layers.
///
/// The start response must carry all three session URLs (uploadPart,
/// complete, status); a part's identity is the `ETag` header of the part
/// upload response.
pub struct BlobV1Backend {
    blob: Arc<dyn BlobApi>,
    base_url: String,
    layer_id: String,
    data_handle: String,
    content_type: String,
    content_encoding: Option<String>,
    billing_tag: Option<String>,
}

impl BlobV1Backend {
    pub fn new(
        blob: Arc<dyn BlobApi>,
        base_url: impl Into<String>,
        layer_id: impl Into<String>,
        data_handle: impl Into<String>,
        content_type: impl Into<String>,
        content_encoding: Option<String>,
        billing_tag: Option<String>,
    ) -> Self {
        Self {
            blob,
            base_url: base_url.into(),
            layer_id: layer_id.into(),
            data_handle: data_handle.into(),
            content_type: content_type.into(),
            content_encoding,
            billing_tag,
        }
    }
}

#[async_trait]
impl MultipartBackend for BlobV1Backend {
    async fn start(&self) -> Result<Box<dyn MultipartSession>, UploadError> {
        let response = self
            .blob
            .start_multipart(
                &self.base_url,
                &self.layer_id,
                &self.data_handle,
                &self.content_type,
                self.content_encoding.as_deref(),
                self.billing_tag.as_deref(),
            )
            .await?;

        let links = response
            .links
            .ok_or(UploadError::MissingSessionField("links"))?;
        let upload_part_url = links
            .upload_part
            .ok_or(UploadError::MissingSessionField("links.uploadPart"))?;
        let complete_url = links
            .complete
            .ok_or(UploadError::MissingSessionField("links.complete"))?;
        // The status URL is unused by the pipeline but required by the
        // protocol, so its absence is just as fatal.
        links
            .status
            .ok_or(UploadError::MissingSessionField("links.status"))?;

        Ok(Box::new(BlobV1Session {
            blob: self.blob.clone(),
            upload_part_url,
            complete_url,
            content_type: self.content_type.clone(),
            billing_tag: self.billing_tag.clone(),
        }))
    }
}

struct BlobV1Session {
    blob: Arc<dyn BlobApi>,
    upload_part_url: String,
    complete_url: String,
    content_type: String,
    billing_tag: Option<String>,
}

#[async_trait]
impl MultipartSession for BlobV1Session {
    fn id(&self) -> &str {
        &self.upload_part_url
    }

    async fn upload_part(&self, number: u32, body: Bytes) -> Result<UploadPart, UploadError> {
        let result = self
            .blob
            .upload_part(
                &self.upload_part_url,
                number,
                body,
                &self.content_type,
                self.billing_tag.as_deref(),
            )
            .await?;
        let etag = result.etag.ok_or(UploadError::MissingPartId {
            number,
            field: "ETag",
        })?;
        Ok(UploadPart { number, id: etag })
    }

    async fn complete(&self, parts: Vec<UploadPart>) -> Result<u16, UploadError> {
        Ok(self
            .blob
            .complete_multipart(&self.complete_url, &parts, self.billing_tag.as_deref())
            .await?)
    }
}

// =============================================================================
// Variant 2: object store
// =============================================================================

/// Multipart backend over the object-store (v2) service, used by volatile
/// layers.
///
/// The start response must carry the opaque multipart token; a part's
/// identity is the `id` field of the part upload response body.
pub struct ObjectStoreV2Backend {
    object_store: Arc<dyn ObjectStoreApi>,
    base_url: String,
    layer_id: String,
    key: String,
    content_type: String,
    content_encoding: Option<String>,
    billing_tag: Option<String>,
}

impl ObjectStoreV2Backend {
    pub fn new(
        object_store: Arc<dyn ObjectStoreApi>,
        base_url: impl Into<String>,
        layer_id: impl Into<String>,
        key: impl Into<String>,
        content_type: impl Into<String>,
        content_encoding: Option<String>,
        billing_tag: Option<String>,
    ) -> Self {
        Self {
            object_store,
            base_url: base_url.into(),
            layer_id: layer_id.into(),
            key: key.into(),
            content_type: content_type.into(),
            content_encoding,
            billing_tag,
        }
    }
}

#[async_trait]
impl MultipartBackend for ObjectStoreV2Backend {
    async fn start(&self) -> Result<Box<dyn MultipartSession>, UploadError> {
        let response = self
            .object_store
            .start_multipart(
                &self.base_url,
                &self.layer_id,
                &self.key,
                &self.content_type,
                self.content_encoding.as_deref(),
                self.billing_tag.as_deref(),
            )
            .await?;

        let multipart_token = response
            .multipart_token
            .ok_or(UploadError::MissingSessionField("multipartToken"))?;

        Ok(Box::new(ObjectStoreV2Session {
            object_store: self.object_store.clone(),
            base_url: self.base_url.clone(),
            layer_id: self.layer_id.clone(),
            multipart_token,
            content_type: self.content_type.clone(),
        }))
    }
}

struct ObjectStoreV2Session {
    object_store: Arc<dyn ObjectStoreApi>,
    base_url: String,
    layer_id: String,
    multipart_token: String,
    content_type: String,
}

#[async_trait]
impl MultipartSession for ObjectStoreV2Session {
    fn id(&self) -> &str {
        &self.multipart_token
    }

    async fn upload_part(&self, number: u32, body: Bytes) -> Result<UploadPart, UploadError> {
        let result = self
            .object_store
            .upload_part(
                &self.base_url,
                &self.layer_id,
                &self.multipart_token,
                number,
                body,
                &self.content_type,
            )
            .await?;
        let id = result.id.ok_or(UploadError::MissingPartId {
            number,
            field: "id",
        })?;
        Ok(UploadPart { number, id })
    }

    async fn complete(&self, parts: Vec<UploadPart>) -> Result<u16, UploadError> {
        Ok(self
            .object_store
            .complete_multipart(&self.base_url, &self.layer_id, &self.multipart_token, &parts)
            .await?)
    }
}

use http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the collaborator transports (discovery, metadata
/// queries, blob services).
///
/// None of these are retried internally; retry/backoff is a caller concern.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Non-success response from a collaborator, with the server-provided
    /// message.
    #[error("protocol error: HTTP {status}: {message}")]
    Protocol { status: StatusCode, message: String },

    /// Network or connection failure before a response was received.
    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    /// Build a protocol error from a raw status code, falling back to 500
    /// when the code is out of range.
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        TransportError::Protocol {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        }
    }
}

/// Errors from catalog metadata operations: endpoint resolution, version
/// resolution, tile/partition resolution, and data fetch.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Requested tile or partition is absent after exhausting the exact
    /// match and every ancestor level. Carries the originally requested key.
    #[error("partition not found: {0}")]
    NotFound(String),

    /// Operation invoked against an incompatible layer kind. Raised before
    /// any network call.
    #[error("unsupported layer kind for {operation}: {kind} (only versioned and volatile layers are supported)")]
    Unsupported {
        operation: &'static str,
        kind: String,
    },

    /// Service discovery responded, but the requested api/version pair was
    /// not in the response.
    #[error("no endpoint for api {api} {version} in discovery response")]
    MissingEndpoint { api: String, version: String },

    /// A collaborator transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors from the chunked upload pipeline.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The multipart start response was missing a required field (an upload
    /// URL or the multipart token). Fatal before any part is uploaded.
    #[error("multipart start response missing {0}")]
    MissingSessionField(&'static str),

    /// A part upload response carried no identity (ETag header or body id).
    /// Fatal for that chunk.
    #[error("part {number} response missing {field}")]
    MissingPartId { number: u32, field: &'static str },

    /// The byte source failed to produce the requested range.
    #[error("upload source error: {0}")]
    Source(String),

    /// A spawned part-upload task failed to run to completion.
    #[error("upload task failed: {0}")]
    TaskFailure(String),

    /// The upload transport's endpoint could not be resolved.
    #[error("upload endpoint unavailable: {0}")]
    Endpoint(CatalogError),

    /// A collaborator transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

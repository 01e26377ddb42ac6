use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::error::UploadError;
use crate::transport::UploadPart;

use super::backend::{MultipartBackend, MultipartSession};
use super::source::UploadSource;

/// Default and minimum chunk size in MiB.
pub const DEFAULT_CHUNK_SIZE_MIB: u64 = 5;
/// Smallest chunk size the backends accept, in MiB.
pub const MIN_CHUNK_SIZE_MIB: u64 = 5;
/// Largest chunk size the backends accept, in MiB.
pub const MAX_CHUNK_SIZE_MIB: u64 = 5120;
/// Default number of concurrent in-flight part uploads.
pub const DEFAULT_PARALLEL_REQUESTS: usize = 6;

const MIB: u64 = 1024 * 1024;

/// Options for one upload call.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// MIME type sent with the session and each part.
    pub content_type: String,
    /// Optional content encoding of the payload.
    pub content_encoding: Option<String>,
    /// Optional billing tag threaded through every transport call that
    /// accepts one.
    pub billing_tag: Option<String>,
    /// Requested chunk size in MiB. Values outside
    /// [`MIN_CHUNK_SIZE_MIB`]..=[`MAX_CHUNK_SIZE_MIB`] fall back to the
    /// default without failing the upload.
    pub chunk_size_mib: u64,
    /// Upper bound on concurrent in-flight part uploads per batch.
    pub parallel_requests: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            content_encoding: None,
            billing_tag: None,
            chunk_size_mib: DEFAULT_CHUNK_SIZE_MIB,
            parallel_requests: DEFAULT_PARALLEL_REQUESTS,
        }
    }
}

impl UploadOptions {
    /// The chunk size actually used, in bytes: the configured size when it
    /// is within bounds, the default otherwise.
    pub fn effective_chunk_size_bytes(&self) -> u64 {
        if (MIN_CHUNK_SIZE_MIB..=MAX_CHUNK_SIZE_MIB).contains(&self.chunk_size_mib) {
            self.chunk_size_mib * MIB
        } else {
            debug!(
                requested = self.chunk_size_mib,
                fallback = DEFAULT_CHUNK_SIZE_MIB,
                "chunk size out of bounds"
            );
            DEFAULT_CHUNK_SIZE_MIB * MIB
        }
    }
}

// =============================================================================
// Progress notification
// =============================================================================

/// Emitted once per upload, after the session started and before the first
/// part is dispatched.
#[derive(Debug, Clone)]
pub struct UploadStarted {
    /// Session identifier (the part-upload URL for v1, the token for v2).
    pub session_id: String,
    pub total_bytes: u64,
    pub total_chunks: u32,
    /// Effective chunk size in bytes.
    pub chunk_size: u64,
}

/// Emitted once per completed part, in completion order (which may differ
/// from chunk-number order).
#[derive(Debug, Clone)]
pub struct PartUploaded {
    pub part: UploadPart,
    /// Parts completed so far, this one included.
    pub uploaded_chunks: u32,
    pub total_chunks: u32,
    /// Byte length of this chunk (the last chunk may be shorter).
    pub chunk_bytes: u64,
}

/// Injected sink for upload lifecycle notifications.
///
/// Events arrive from the task that completed the part, so implementations
/// must tolerate concurrent calls.
pub trait UploadProgress: Send + Sync {
    fn upload_started(&self, _event: &UploadStarted) {}
    fn part_uploaded(&self, _event: &PartUploaded) {}
}

/// Sink that drops every event; the default.
pub struct NoopProgress;

impl UploadProgress for NoopProgress {}

// =============================================================================
// Uploader
// =============================================================================

/// Drives a byte source through a multipart session with batched bounded
/// concurrency.
///
/// Chunk numbers are assigned in strict reading order starting at 1, before
/// dispatch, so numbering is deterministic even though completion order is
/// not. The uploader fills a batch of at most `parallel_requests` in-flight
/// parts, awaits the whole batch, then reads on. A failing member fails the
/// batch as soon as it is observed ("first rejection wins"); sibling tasks
/// already in flight are left to run to completion.
pub struct MultipartUploader {
    backend: Arc<dyn MultipartBackend>,
    options: UploadOptions,
    progress: Arc<dyn UploadProgress>,
}

impl MultipartUploader {
    /// Create an uploader with default options and no progress sink.
    pub fn new(backend: Arc<dyn MultipartBackend>) -> Self {
        Self {
            backend,
            options: UploadOptions::default(),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn UploadProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Upload the whole source and complete the session.
    ///
    /// The source's finalize hook runs exactly once before this returns,
    /// regardless of outcome. On success the completion call's status code
    /// is returned.
    pub async fn upload(&self, source: &dyn UploadSource) -> Result<u16, UploadError> {
        let result = self.run(source).await;
        source.finalize().await;
        result
    }

    async fn run(&self, source: &dyn UploadSource) -> Result<u16, UploadError> {
        let chunk_size = self.options.effective_chunk_size_bytes();
        let total_bytes = source.size();
        let total_chunks = u32::try_from(total_bytes.div_ceil(chunk_size))
            .map_err(|_| UploadError::Source(format!("source of {total_bytes} bytes is too large")))?;
        let parallel = self.options.parallel_requests.max(1);

        let session: Arc<dyn MultipartSession> = Arc::from(self.backend.start().await?);
        debug!(
            session = session.id(),
            total_bytes, total_chunks, chunk_size, "multipart upload started"
        );
        self.progress.upload_started(&UploadStarted {
            session_id: session.id().to_string(),
            total_bytes,
            total_chunks,
            chunk_size,
        });

        let uploaded = Arc::new(AtomicU32::new(0));
        let mut parts: Vec<UploadPart> = Vec::with_capacity(total_chunks as usize);
        let mut offset = 0u64;
        let mut next_number = 1u32;

        while offset < total_bytes {
            let mut handles = Vec::with_capacity(parallel);
            while offset < total_bytes && handles.len() < parallel {
                let len = chunk_size.min(total_bytes - offset) as usize;
                let body = source.read_bytes(offset, len).await?;
                if body.len() != len {
                    return Err(UploadError::Source(format!(
                        "short read at offset {offset}: wanted {len} bytes, got {}",
                        body.len()
                    )));
                }
                let number = next_number;
                next_number += 1;
                offset += len as u64;

                let session = session.clone();
                let progress = self.progress.clone();
                let uploaded = uploaded.clone();
                handles.push(tokio::spawn(async move {
                    let part = session.upload_part(number, body).await?;
                    let done = uploaded.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.part_uploaded(&PartUploaded {
                        part: part.clone(),
                        uploaded_chunks: done,
                        total_chunks,
                        chunk_bytes: len as u64,
                    });
                    Ok::<UploadPart, UploadError>(part)
                }));
            }

            // Join the whole batch before reading further chunks. The first
            // error wins; sibling tasks keep running unobserved.
            let batch = try_join_all(handles.into_iter().map(|handle| async move {
                match handle.await {
                    Ok(result) => result,
                    Err(join_error) => Err(UploadError::TaskFailure(join_error.to_string())),
                }
            }))
            .await;
            match batch {
                Ok(batch) => parts.extend(batch),
                Err(error) => {
                    warn!(%error, "part upload batch failed");
                    return Err(error);
                }
            }
        }

        let status = session.complete(parts).await?;
        debug!(session = session.id(), status, "multipart upload completed");
        Ok(status)
    }
}

//! Chunked multipart upload pipeline.
//!
//! Large payloads are uploaded as numbered parts driven through a
//! multipart session: start, a bounded number of concurrent part uploads,
//! then one completion call referencing every part identity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   MultipartUploader                      │
//! │   read chunk → assign number → dispatch   (per batch)    │
//! │   await whole batch → record parts → next batch          │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │
//!                 ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │          MultipartBackend / MultipartSession             │
//! │   BlobV1 (start URLs, ETag)  │  ObjectStoreV2 (token,    │
//! │                              │  body id)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The two backend variants validate their own protocol invariants: a v1
//! start that does not return all three URLs, or a v2 start without a
//! multipart token, aborts before any part is uploaded; a part response
//! without an identity fails its batch.
//!
//! Concurrency is batched, not a sliding window: the uploader fills a batch
//! of at most `parallel_requests` in-flight parts, awaits the whole batch,
//! and only then reads further chunks. A failing member fails the batch
//! immediately; its in-flight siblings are not cancelled.

mod backend;
mod pipeline;
mod source;

pub use backend::{BlobV1Backend, MultipartBackend, MultipartSession, ObjectStoreV2Backend};
pub use pipeline::{
    MultipartUploader, NoopProgress, PartUploaded, UploadOptions, UploadProgress, UploadStarted,
    DEFAULT_CHUNK_SIZE_MIB, DEFAULT_PARALLEL_REQUESTS, MAX_CHUNK_SIZE_MIB, MIN_CHUNK_SIZE_MIB,
};
pub use source::{BytesUploadSource, UploadSource};

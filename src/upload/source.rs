use async_trait::async_trait;
use bytes::Bytes;

use crate::error::UploadError;

/// An abstract byte source for the upload pipeline.
///
/// The pipeline reads chunks sequentially via `read_bytes` and calls
/// `finalize` exactly once after the upload finishes, whether it succeeded
/// or failed. Implementations backed by files or streams release their
/// resources there.
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Total size of the payload in bytes.
    fn size(&self) -> u64;

    /// Read exactly `count` bytes starting at `offset`.
    async fn read_bytes(&self, offset: u64, count: usize) -> Result<Bytes, UploadError>;

    /// Hook invoked once after the upload, regardless of outcome.
    async fn finalize(&self) {}
}

/// In-memory [`UploadSource`] over a `Bytes` buffer.
pub struct BytesUploadSource {
    data: Bytes,
}

impl BytesUploadSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl UploadSource for BytesUploadSource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_bytes(&self, offset: u64, count: usize) -> Result<Bytes, UploadError> {
        let start = usize::try_from(offset)
            .map_err(|_| UploadError::Source(format!("offset {offset} out of range")))?;
        let end = start.checked_add(count).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => Ok(self.data.slice(start..end)),
            None => Err(UploadError::Source(format!(
                "range {offset}+{count} exceeds source size {}",
                self.data.len()
            ))),
        }
    }
}

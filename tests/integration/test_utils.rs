//! Shared mock transports for integration tests.
//!
//! Every mock counts its calls so tests can assert the exact number of
//! network round trips an operation costs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use quadcatalog::{
    Api, BlobApi, BlobPartResult, LookupApi, MultipartLinks, MultipartStartResponse,
    MultipartTokenResponse, ObjectPartResult, ObjectStoreApi, Partition, PartitionsResponse,
    QuadTreeIndex, QueryApi, TransportError, UploadPart, VersionResponse,
};

/// Install a log subscriber once, so `RUST_LOG=quadcatalog=debug` surfaces
/// client traces during test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// =============================================================================
// Discovery
// =============================================================================

pub struct MockLookup {
    pub call_count: AtomicUsize,
}

impl MockLookup {
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LookupApi for MockLookup {
    async fn lookup(&self, _catalog_hrn: &str) -> Result<Vec<Api>, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let descriptor = |api: &str, version: &str, url: &str| Api {
            api: api.to_string(),
            version: version.to_string(),
            base_url: url.to_string(),
        };
        Ok(vec![
            descriptor("query", "v1", "https://query.example.com/v1"),
            descriptor("metadata", "v1", "https://metadata.example.com/v1"),
            descriptor("blob", "v1", "https://blob.example.com/v1"),
            descriptor("objectstore", "v2", "https://objectstore.example.com/v2"),
        ])
    }
}

// =============================================================================
// Query
// =============================================================================

pub struct MockQuery {
    pub index: QuadTreeIndex,
    pub partitions: Vec<Partition>,
    pub latest_version: u64,
    pub quad_tree_calls: AtomicUsize,
    pub partition_calls: AtomicUsize,
    pub latest_version_calls: AtomicUsize,
}

impl MockQuery {
    pub fn new(index: QuadTreeIndex) -> Self {
        Self {
            index,
            partitions: Vec::new(),
            latest_version: 12,
            quad_tree_calls: AtomicUsize::new(0),
            partition_calls: AtomicUsize::new(0),
            latest_version_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_partitions(mut self, partitions: Vec<Partition>) -> Self {
        self.partitions = partitions;
        self
    }
}

#[async_trait]
impl QueryApi for MockQuery {
    async fn get_partitions_by_id(
        &self,
        _base_url: &str,
        _layer_id: &str,
        partition_ids: &[String],
        _version: Option<u64>,
    ) -> Result<PartitionsResponse, TransportError> {
        self.partition_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PartitionsResponse {
            partitions: self
                .partitions
                .iter()
                .filter(|p| partition_ids.contains(&p.partition))
                .cloned()
                .collect(),
        })
    }

    async fn get_quad_tree_index(
        &self,
        _base_url: &str,
        _layer_id: &str,
        _version: Option<u64>,
        _root_partition_id: &str,
        _depth: u32,
    ) -> Result<QuadTreeIndex, TransportError> {
        self.quad_tree_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.index.clone())
    }

    async fn get_latest_version(
        &self,
        _base_url: &str,
        _start_version: i64,
    ) -> Result<VersionResponse, TransportError> {
        self.latest_version_calls.fetch_add(1, Ordering::SeqCst);
        Ok(VersionResponse {
            version: self.latest_version,
        })
    }
}

// =============================================================================
// Blob v1
// =============================================================================

pub struct MockBlob {
    pub blobs: Mutex<HashMap<String, Bytes>>,
    pub omit_etag: bool,
    pub get_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub part_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    /// (number, byte length) per uploaded part.
    pub uploaded_parts: Mutex<Vec<(u32, u64)>>,
    /// Parts list submitted at completion.
    pub completed_parts: Mutex<Option<Vec<UploadPart>>>,
}

impl MockBlob {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            omit_etag: false,
            get_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            part_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            uploaded_parts: Mutex::new(Vec::new()),
            completed_parts: Mutex::new(None),
        }
    }

    pub fn with_blob(self, data_handle: &str, data: impl Into<Bytes>) -> Self {
        self.blobs
            .lock()
            .unwrap()
            .insert(data_handle.to_string(), data.into());
        self
    }

    pub fn without_etags(mut self) -> Self {
        self.omit_etag = true;
        self
    }

    /// Total transport calls made through the multipart surface.
    pub fn multipart_call_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
            + self.part_calls.load(Ordering::SeqCst)
            + self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobApi for MockBlob {
    async fn get_blob(
        &self,
        _base_url: &str,
        _layer_id: &str,
        data_handle: &str,
    ) -> Result<Bytes, TransportError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .unwrap()
            .get(data_handle)
            .cloned()
            .ok_or_else(|| TransportError::protocol(404, format!("no blob {data_handle}")))
    }

    async fn put_blob(
        &self,
        _base_url: &str,
        _layer_id: &str,
        data_handle: &str,
        _content_type: &str,
        body: Bytes,
        _billing_tag: Option<&str>,
    ) -> Result<(), TransportError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(data_handle.to_string(), body);
        Ok(())
    }

    async fn blob_exists(
        &self,
        _base_url: &str,
        _layer_id: &str,
        data_handle: &str,
    ) -> Result<bool, TransportError> {
        Ok(self.blobs.lock().unwrap().contains_key(data_handle))
    }

    async fn delete_blob(
        &self,
        _base_url: &str,
        _layer_id: &str,
        data_handle: &str,
    ) -> Result<(), TransportError> {
        self.blobs.lock().unwrap().remove(data_handle);
        Ok(())
    }

    async fn start_multipart(
        &self,
        _base_url: &str,
        _layer_id: &str,
        data_handle: &str,
        _content_type: &str,
        _content_encoding: Option<&str>,
        _billing_tag: Option<&str>,
    ) -> Result<MultipartStartResponse, TransportError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MultipartStartResponse {
            links: Some(MultipartLinks {
                upload_part: Some(format!("https://blob.example.com/v1/{data_handle}/parts")),
                complete: Some(format!("https://blob.example.com/v1/{data_handle}/complete")),
                status: Some(format!("https://blob.example.com/v1/{data_handle}/status")),
            }),
        })
    }

    async fn upload_part(
        &self,
        _upload_part_url: &str,
        part_number: u32,
        body: Bytes,
        _content_type: &str,
        _billing_tag: Option<&str>,
    ) -> Result<BlobPartResult, TransportError> {
        self.part_calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded_parts
            .lock()
            .unwrap()
            .push((part_number, body.len() as u64));
        Ok(BlobPartResult {
            etag: (!self.omit_etag).then(|| format!("etag-{part_number}")),
        })
    }

    async fn complete_multipart(
        &self,
        _complete_url: &str,
        parts: &[UploadPart],
        _billing_tag: Option<&str>,
    ) -> Result<u16, TransportError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.completed_parts.lock().unwrap() = Some(parts.to_vec());
        Ok(204)
    }
}

// =============================================================================
// Object store v2
// =============================================================================

pub struct MockObjectStore {
    pub objects: Mutex<HashMap<String, Bytes>>,
    pub get_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub part_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    pub completed_parts: Mutex<Option<Vec<UploadPart>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            get_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            part_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            completed_parts: Mutex::new(None),
        }
    }

    pub fn with_object(self, key: &str, data: impl Into<Bytes>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.into());
        self
    }
}

#[async_trait]
impl ObjectStoreApi for MockObjectStore {
    async fn get_object(
        &self,
        _base_url: &str,
        _layer_id: &str,
        key: &str,
    ) -> Result<Bytes, TransportError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::protocol(404, format!("no object {key}")))
    }

    async fn put_object(
        &self,
        _base_url: &str,
        _layer_id: &str,
        key: &str,
        _content_type: &str,
        body: Bytes,
        _billing_tag: Option<&str>,
    ) -> Result<(), TransportError> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn object_exists(
        &self,
        _base_url: &str,
        _layer_id: &str,
        key: &str,
    ) -> Result<bool, TransportError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn delete_object(
        &self,
        _base_url: &str,
        _layer_id: &str,
        key: &str,
    ) -> Result<(), TransportError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn start_multipart(
        &self,
        _base_url: &str,
        _layer_id: &str,
        key: &str,
        _content_type: &str,
        _content_encoding: Option<&str>,
        _billing_tag: Option<&str>,
    ) -> Result<MultipartTokenResponse, TransportError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MultipartTokenResponse {
            multipart_token: Some(format!("token-{key}")),
        })
    }

    async fn upload_part(
        &self,
        _base_url: &str,
        _layer_id: &str,
        _multipart_token: &str,
        part_number: u32,
        _body: Bytes,
        _content_type: &str,
    ) -> Result<ObjectPartResult, TransportError> {
        self.part_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ObjectPartResult {
            id: Some(format!("part-{part_number}")),
        })
    }

    async fn complete_multipart(
        &self,
        _base_url: &str,
        _layer_id: &str,
        _multipart_token: &str,
        parts: &[UploadPart],
    ) -> Result<u16, TransportError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.completed_parts.lock().unwrap() = Some(parts.to_vec());
        Ok(204)
    }
}

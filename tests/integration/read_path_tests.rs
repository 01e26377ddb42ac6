//! End-to-end read path: discovery, version resolution, tile/partition
//! resolution, and data fetch over mock transports.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use quadcatalog::{
    CatalogError, CatalogSettings, LayerClient, LayerKind, ParentQuad, Partition, QuadKey,
    QuadTreeIndex, SubQuad, VersionedLayerClient, VolatileLayerClient,
};

use super::test_utils::{init_tracing, MockBlob, MockLookup, MockObjectStore, MockQuery};

fn settings(lookup: Arc<MockLookup>) -> Arc<CatalogSettings> {
    Arc::new(CatalogSettings::new("hrn:here:data::olp-here:rib-2", lookup))
}

#[tokio::test]
async fn test_ancestor_fallback_scenario() {
    init_tracing();

    // A subtree query response with one parent quad standing in for the
    // requested tile, and no matching subquad.
    let requested = QuadKey::from_morton_code(73982 << 8);
    let index = QuadTreeIndex {
        sub_quads: vec![],
        parent_quads: vec![ParentQuad {
            partition: "73982".to_string(),
            version: 12,
            data_handle: "675911FF".to_string(),
        }],
    };

    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(index));
    let blob = Arc::new(MockBlob::new().with_blob("675911FF", &b"coarse tile payload"[..]));
    let client = VersionedLayerClient::new(
        settings(lookup),
        "topology-geometry",
        query.clone(),
        blob.clone(),
    );

    let record = client.get_tile(requested, None).await.unwrap();
    assert_eq!(record.data_handle, "675911FF");

    let data = client.get_tile_data(requested, None).await.unwrap();
    assert_eq!(&data[..], b"coarse tile payload");

    // One discovery, one latest-version, one subtree query, one blob get.
    assert_eq!(query.latest_version_calls.load(Ordering::SeqCst), 1);
    assert_eq!(query.quad_tree_calls.load(Ordering::SeqCst), 1);
    assert_eq!(blob.get_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_one_discovery_call_per_settings() {
    let requested = QuadKey::from_morton_code(73982 << 8);
    let index = QuadTreeIndex {
        sub_quads: vec![],
        parent_quads: vec![ParentQuad {
            partition: "73982".to_string(),
            version: 12,
            data_handle: "675911FF".to_string(),
        }],
    };

    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(index));
    let blob = Arc::new(MockBlob::new().with_blob("675911FF", &b"x"[..]));
    let client = VersionedLayerClient::new(
        settings(lookup.clone()),
        "topology-geometry",
        query,
        blob,
    );

    client.get_tile_data(requested, None).await.unwrap();
    client.get_tile_data(requested, None).await.unwrap();

    // Query, metadata, and blob endpoints all come from the single
    // discovery response.
    assert_eq!(lookup.call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sibling_tiles_come_from_one_subtree_query() {
    let root = QuadKey::from_morton_code(73982);
    // Four siblings at relative depth 4 under the same root.
    let relatives = [256u64, 257, 258, 259];
    let index = QuadTreeIndex {
        sub_quads: relatives
            .iter()
            .map(|code| SubQuad {
                sub_quad_key: code.to_string(),
                version: 12,
                data_handle: format!("handle-{code}"),
            })
            .collect(),
        parent_quads: vec![],
    };

    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(index));
    let blob = Arc::new(MockBlob::new());
    let client =
        VersionedLayerClient::new(settings(lookup), "topology-geometry", query.clone(), blob);

    for code in relatives {
        let tile = root.add(&QuadKey::from_morton_code(code));
        let record = client.get_tile(tile, None).await.unwrap();
        assert_eq!(record.data_handle, format!("handle-{code}"));
    }

    assert_eq!(query.quad_tree_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_tile_is_not_found() {
    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(QuadTreeIndex::default()));
    let blob = Arc::new(MockBlob::new());
    let client =
        VersionedLayerClient::new(settings(lookup), "topology-geometry", query, blob);

    let requested = QuadKey::from_morton_code(73982);
    let err = client.get_tile(requested, None).await.unwrap_err();
    match err {
        CatalogError::NotFound(key) => assert_eq!(key, "73982"),
        e => panic!("expected NotFound, got {e:?}"),
    }
}

#[tokio::test]
async fn test_explicit_partition_batch() {
    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(QuadTreeIndex::default()).with_partitions(vec![
        Partition::new("road-segments-1", 12, "AAAA"),
        Partition::new("road-segments-2", 12, "BBBB"),
    ]));
    let blob = Arc::new(MockBlob::new().with_blob("AAAA", &b"segment one"[..]));
    let client = VersionedLayerClient::new(
        settings(lookup),
        "topology-geometry",
        query.clone(),
        blob,
    );

    let ids = vec![
        "road-segments-1".to_string(),
        "road-segments-2".to_string(),
        "road-segments-404".to_string(),
    ];
    let records = client.get_partitions(&ids, None).await.unwrap();

    // The unknown id is absent, not an error.
    assert_eq!(records.len(), 2);
    assert_eq!(query.partition_calls.load(Ordering::SeqCst), 1);

    let data = client.get_data(&records[0].data_handle).await.unwrap();
    assert_eq!(&data[..], b"segment one");

    // A repeat batch for known ids is answered from cache.
    let again = client
        .get_partitions(&ids[..2].to_vec(), None)
        .await
        .unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(query.partition_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_volatile_layer_read_path() {
    let root = QuadKey::from_morton_code(73982);
    let tile = root.add(&QuadKey::from_morton_code(256));
    let index = QuadTreeIndex {
        sub_quads: vec![SubQuad {
            sub_quad_key: "256".to_string(),
            version: 0,
            data_handle: "LIVE01".to_string(),
        }],
        parent_quads: vec![],
    };

    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(index));
    let object_store = Arc::new(MockObjectStore::new().with_object("LIVE01", &b"live payload"[..]));
    let client = VolatileLayerClient::new(
        settings(lookup),
        "live-traffic",
        query.clone(),
        object_store.clone(),
    );

    let data = client.get_tile_data(tile).await.unwrap();
    assert_eq!(&data[..], b"live payload");

    // Volatile resolution never resolves a catalog version.
    assert_eq!(query.latest_version_calls.load(Ordering::SeqCst), 0);
    assert_eq!(object_store.get_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_layer_kind_gate() {
    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(QuadTreeIndex::default()));
    let blob = Arc::new(MockBlob::new());
    let object_store = Arc::new(MockObjectStore::new());

    let err = LayerClient::for_kind(
        LayerKind::Index,
        settings(lookup.clone()),
        "index-layer",
        query,
        blob,
        object_store,
    )
    .err()
    .expect("index layers are not readable");

    assert!(matches!(err, CatalogError::Unsupported { .. }));
    assert_eq!(lookup.call_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blob_write_helpers() {
    let lookup = Arc::new(MockLookup::new());
    let query = Arc::new(MockQuery::new(QuadTreeIndex::default()));
    let blob = Arc::new(MockBlob::new());
    let client = VersionedLayerClient::new(
        settings(lookup),
        "topology-geometry",
        query,
        blob.clone(),
    );

    assert!(!client.data_exists("NEW01").await.unwrap());

    client
        .put_data(
            "NEW01",
            "application/octet-stream",
            Bytes::from_static(b"payload"),
            None,
        )
        .await
        .unwrap();
    assert!(client.data_exists("NEW01").await.unwrap());
    assert_eq!(&client.get_data("NEW01").await.unwrap()[..], b"payload");

    client.delete_data("NEW01").await.unwrap();
    assert!(!client.data_exists("NEW01").await.unwrap());
}

//! End-to-end engine scenarios against a mock S3-compatible server

use loupe_sync::{DeltaKind, DeltaSink, ObjectDelta, StoreConfig, SyncEngine, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "inspection";

/// Run with `RUST_LOG=loupe_sync=debug` to watch the engine work
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn delta_sink() -> (DeltaSink, mpsc::UnboundedReceiver<Vec<ObjectDelta>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: DeltaSink = Arc::new(move |batch| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(batch);
        })
    });
    (sink, rx)
}

async fn recv_batch(rx: &mut mpsc::UnboundedReceiver<Vec<ObjectDelta>>) -> Vec<ObjectDelta> {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a delta batch")
        .expect("sink channel closed")
}

async fn mount_bucket_head(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{}", BUCKET)))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", BUCKET)))
        .and(query_param("list-type", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_notifications(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", BUCKET)))
        .and(query_param("events", "s3:ObjectCreated:*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn connected_engine(server: &MockServer) -> SyncEngine {
    init_tracing();
    let engine = SyncEngine::new(
        StoreConfig::new(server.uri())
            .with_credentials("minioadmin", "minioadmin")
            .with_bucket(BUCKET),
    )
    .with_debounce(Duration::from_millis(50));
    engine.connect().await.unwrap();
    engine
}

const SEED_LISTING: &str = r#"<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
    <IsTruncated>false</IsTruncated>
    <Contents>
        <Key>a.jpg</Key>
        <Size>100</Size>
        <LastModified>2025-06-01T10:00:00Z</LastModified>
    </Contents>
</ListBucketResult>"#;

#[tokio::test]
async fn test_connect_verifies_bucket_existence() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{}", BUCKET)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = SyncEngine::new(
        StoreConfig::new(server.uri())
            .with_credentials("ak", "sk")
            .with_bucket(BUCKET),
    );

    let err = engine.connect().await.unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
    assert!(!engine.is_connected());
}

#[tokio::test]
async fn test_connect_without_bucket_probes_credentials() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<ListAllMyBucketsResult><Buckets></Buckets></ListAllMyBucketsResult>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let engine =
        SyncEngine::new(StoreConfig::new(server.uri()).with_credentials("ak", "sk"));
    engine.connect().await.unwrap();
    assert!(engine.is_connected());

    // connect is idempotent: no second probe
    engine.connect().await.unwrap();

    // but watch still needs a bucket
    let (sink, _rx) = delta_sink();
    assert!(matches!(
        engine.start_watch(sink, None),
        Err(SyncError::Config(_))
    ));
}

#[tokio::test]
async fn test_seed_then_create_event() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_listing(&server, SEED_LISTING).await;
    mount_notifications(
        &server,
        "{\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\
          \"eventTime\":\"2025-06-01T12:00:00Z\",\
          \"s3\":{\"object\":{\"key\":\"b.jpg\",\"size\":50}}}]}\n",
    )
    .await;

    let engine = connected_engine(&server).await;
    assert_eq!(engine.seed_index(None, true).await.unwrap(), 1);

    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    let batch = recv_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].kind, DeltaKind::AddedOrUpdated);
    assert_eq!(batch[0].key, "b.jpg");
    assert_eq!(batch[0].size, Some(50));

    let snapshot = engine.snapshot();
    let view: Vec<(&str, Option<i64>)> = snapshot
        .iter()
        .map(|d| (d.key.as_str(), d.size))
        .collect();
    assert_eq!(view, vec![("a.jpg", Some(100)), ("b.jpg", Some(50))]);
}

#[tokio::test]
async fn test_removal_event() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_listing(
        &server,
        r#"<ListBucketResult>
            <Contents><Key>a.jpg</Key><Size>100</Size></Contents>
            <Contents><Key>b.jpg</Key><Size>50</Size></Contents>
        </ListBucketResult>"#,
    )
    .await;
    mount_notifications(
        &server,
        "{\"Records\":[{\"eventName\":\"s3:ObjectRemoved:Delete\",\
          \"s3\":{\"object\":{\"key\":\"a.jpg\"}}}]}\n",
    )
    .await;

    let engine = connected_engine(&server).await;
    engine.seed_index(None, true).await.unwrap();

    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    let batch = recv_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].kind, DeltaKind::Removed);
    assert_eq!(batch[0].key, "a.jpg");

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].key, "b.jpg");
    assert_eq!(snapshot[0].size, Some(50));
}

#[tokio::test]
async fn test_notification_burst_coalesces_into_one_batch() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_notifications(
        &server,
        "{\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\"s3\":{\"object\":{\"key\":\"x\"}}}]}\n\
         {\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\"s3\":{\"object\":{\"key\":\"y\"}}}]}\n\
         {\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\"s3\":{\"object\":{\"key\":\"z\"}}}]}\n",
    )
    .await;

    let engine = connected_engine(&server).await;
    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    let batch = recv_batch(&mut rx).await;
    let mut keys: Vec<&str> = batch.iter().map(|d| d.key.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["x", "y", "z"]);

    // exactly one batch
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_listing_style_notification_payload() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_notifications(
        &server,
        "<ListBucketResult><Contents><Key>echo.jpg</Key><Size>7</Size></Contents></ListBucketResult>\n",
    )
    .await;

    let engine = connected_engine(&server).await;
    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    let batch = recv_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].kind, DeltaKind::AddedOrUpdated);
    assert_eq!(batch[0].key, "echo.jpg");
    assert_eq!(engine.get("echo.jpg").unwrap().size, Some(7));
}

#[tokio::test]
async fn test_malformed_payload_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_notifications(
        &server,
        "this is not a notification\n\
         {\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\"s3\":{\"object\":{\"key\":\"ok.jpg\",\"size\":1}}}]}\n",
    )
    .await;

    let engine = connected_engine(&server).await;
    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    // the garbage line leaves no trace; the following valid line lands
    let batch = recv_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].key, "ok.jpg");
    assert_eq!(engine.len(), 1);
}

#[tokio::test]
async fn test_malformed_payload_leaves_index_untouched() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_notifications(&server, "{\"Records\": \"oops\"}\n").await;

    let engine = connected_engine(&server).await;
    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());
    assert!(engine.is_empty());
}

#[tokio::test]
async fn test_reconciliation_heals_drift() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;

    // first listing (seed) reports a.jpg:100, later listings report the
    // drifted authoritative state
    Mock::given(method("GET"))
        .and(path(format!("/{}", BUCKET)))
        .and(query_param("list-type", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEED_LISTING))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        r#"<ListBucketResult>
            <Contents><Key>a.jpg</Key><Size>200</Size></Contents>
            <Contents><Key>c.jpg</Key><Size>10</Size></Contents>
        </ListBucketResult>"#,
    )
    .await;

    let engine = connected_engine(&server).await;
    engine.seed_index(None, true).await.unwrap();
    assert_eq!(engine.get("a.jpg").unwrap().size, Some(100));

    let (sink, mut rx) = delta_sink();
    engine
        .start_reconcile(sink, Duration::from_secs(3600), None, true)
        .unwrap();

    let mut batch = recv_batch(&mut rx).await;
    batch.sort_by(|x, y| x.key.cmp(&y.key));
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].kind, DeltaKind::AddedOrUpdated);
    assert_eq!(batch[0].key, "a.jpg");
    assert_eq!(batch[0].size, Some(200));
    assert_eq!(batch[1].kind, DeltaKind::AddedOrUpdated);
    assert_eq!(batch[1].key, "c.jpg");
    assert_eq!(batch[1].size, Some(10));

    let snapshot = engine.snapshot();
    let view: Vec<(&str, Option<i64>)> = snapshot
        .iter()
        .map(|d| (d.key.as_str(), d.size))
        .collect();
    assert_eq!(view, vec![("a.jpg", Some(200)), ("c.jpg", Some(10))]);

    engine.stop_reconcile();
}

#[tokio::test]
async fn test_reconciliation_with_no_drift_dispatches_nothing() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_listing(&server, SEED_LISTING).await;

    let engine = connected_engine(&server).await;
    engine.seed_index(None, true).await.unwrap();

    let (sink, mut rx) = delta_sink();
    engine
        .start_reconcile(sink, Duration::from_secs(3600), None, true)
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(engine.len(), 1);
}

#[tokio::test]
async fn test_reconciliation_retries_after_failed_listing() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", BUCKET)))
        .and(query_param("list-type", "2"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(&server, SEED_LISTING).await;

    let engine = connected_engine(&server).await;
    let (sink, mut rx) = delta_sink();
    engine
        .start_reconcile(sink, Duration::from_millis(100), None, true)
        .unwrap();

    // first pass fails, second pass lands the listing
    let batch = recv_batch(&mut rx).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].key, "a.jpg");
    assert_eq!(engine.len(), 1);
}

#[tokio::test]
async fn test_watch_restart_creates_fresh_subscription() {
    let server = MockServer::start().await;
    mount_bucket_head(&server).await;
    mount_notifications(
        &server,
        "{\"Records\":[{\"eventName\":\"s3:ObjectCreated:Put\",\"s3\":{\"object\":{\"key\":\"one\"}}}]}\n",
    )
    .await;

    let engine = connected_engine(&server).await;

    let (sink, mut rx) = delta_sink();
    engine.start_watch(sink, None).unwrap();
    assert_eq!(recv_batch(&mut rx).await.len(), 1);

    engine.stop_watch();

    // restart is permitted and subscribes again
    let (sink2, mut rx2) = delta_sink();
    engine.start_watch(sink2, None).unwrap();
    assert_eq!(recv_batch(&mut rx2).await.len(), 1);
}

//! Integration tests for S3ObjectStore against real MinIO.
//!
//! Requires a local MinIO on :9000 with a `blobmirror-test` bucket:
//! `cargo test -p blobmirror-store -- --ignored`

use aws_sdk_s3::primitives::ByteStream;
use blobmirror_store::{ConnectionInfo, ObjectStore, S3ObjectStore, StoreError};
use pretty_assertions::assert_eq;
use serial_test::serial;

const BUCKET: &str = "blobmirror-test";

fn minio_info() -> ConnectionInfo {
    "Region=us-east-1;Endpoint=http://localhost:9000;AccessKeyId=minioadmin;SecretAccessKey=minioadmin;MaxAttempts=2"
        .parse()
        .unwrap()
}

fn raw_client() -> aws_sdk_s3::Client {
    let info = minio_info();
    let credentials = aws_credential_types::Credentials::new(
        info.access_key_id.unwrap(),
        info.secret_access_key.unwrap(),
        None,
        None,
        "blobmirror-test",
    );
    let config = aws_sdk_s3::Config::builder()
        .region(aws_types::region::Region::new(info.region))
        .credentials_provider(credentials)
        .endpoint_url(info.endpoint.unwrap())
        .force_path_style(true)
        .behavior_version_latest()
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

async fn put(key: &str, body: &[u8]) {
    raw_client()
        .put_object()
        .bucket(BUCKET)
        .key(key)
        .body(ByteStream::from(body.to_vec()))
        .send()
        .await
        .unwrap();
}

fn unique_prefix() -> String {
    format!(
        "test-runs/{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

#[tokio::test]
#[ignore = "requires local MinIO"]
#[serial]
async fn head_then_download_roundtrip() {
    let store = S3ObjectStore::connect(&minio_info()).await.unwrap();
    let key = format!("{}/report.txt", unique_prefix());
    put(&key, b"hello mirror").await;

    let meta = store.head(BUCKET, &key).await.unwrap();
    assert_eq!(meta.size_bytes, 12);
    assert!(!meta.etag.starts_with('"'));

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("report.txt");
    let written = store.download_to(BUCKET, &key, &dest).await.unwrap();
    assert_eq!(written, 12);
    assert_eq!(std::fs::read(&dest).unwrap(), b"hello mirror");
}

#[tokio::test]
#[ignore = "requires local MinIO"]
#[serial]
async fn listing_paginates_with_continuation() {
    let store = S3ObjectStore::connect(&minio_info()).await.unwrap();
    let prefix = unique_prefix();
    for name in ["a", "b", "c"] {
        put(&format!("{prefix}/{name}"), name.as_bytes()).await;
    }

    let mut seen = 0;
    let mut continuation: Option<String> = None;
    loop {
        let page = store.list_page(BUCKET, continuation.as_deref(), 2).await.unwrap();
        assert!(page.objects.len() <= 2);
        seen += page.objects.iter().filter(|o| o.name.starts_with(&prefix)).count();
        continuation = page.continuation;
        if continuation.is_none() {
            break;
        }
    }
    assert_eq!(seen, 3);
}

#[tokio::test]
#[ignore = "requires local MinIO"]
#[serial]
async fn missing_object_is_not_found() {
    let store = S3ObjectStore::connect(&minio_info()).await.unwrap();
    let err = store.head(BUCKET, "does/not/exist").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

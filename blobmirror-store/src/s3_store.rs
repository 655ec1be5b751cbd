//! S3 listing, metadata and download operations.
//!
//! Works against AWS or any S3-compatible endpoint (MinIO in testing).
//! The SDK's standard retry mode provides exponential backoff; the retry
//! budget comes from [`ConnectionInfo::max_attempts`].

use crate::config::ConnectionInfo;
use crate::error::{StoreError, StoreResult};
use crate::object_store::{partial_path, ObjectStore};
use crate::types::{normalize_etag, ObjectPage, RemoteObject};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Object store backed by the AWS S3 SDK.
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Builds a client from parsed connection info.
    pub async fn connect(info: &ConnectionInfo) -> StoreResult<Self> {
        let region = aws_types::region::Region::new(info.region.clone());
        let retry = RetryConfig::standard().with_max_attempts(info.max_attempts);

        let mut config_builder = match (&info.access_key_id, &info.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = aws_credential_types::Credentials::new(
                    access_key,
                    secret_key,
                    info.session_token.clone(),
                    None,
                    "blobmirror-static",
                );
                aws_sdk_s3::Config::builder()
                    .region(region)
                    .credentials_provider(credentials)
                    .behavior_version_latest()
                    .retry_config(retry)
            }
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .retry_config(retry)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        if let Some(ref endpoint) = info.endpoint {
            config_builder = config_builder.endpoint_url(endpoint).force_path_style(true);
        }

        debug!("connected S3 object store in region {}", info.region);
        Ok(Self {
            client: S3Client::from_conf(config_builder.build()),
        })
    }

    /// Parses a connection descriptor and connects.
    pub async fn from_descriptor(descriptor: &str) -> StoreResult<Self> {
        let info: ConnectionInfo = descriptor.parse()?;
        Self::connect(&info).await
    }
}

fn locator(container: &str, name: &str) -> String {
    format!("s3://{container}/{name}")
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        container: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> StoreResult<ObjectPage> {
        let max_keys = i32::try_from(page_size.max(1)).unwrap_or(i32::MAX);
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(container)
            .max_keys(max_keys);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let resp = request.send().await.map_err(|e| {
            let context = DisplayErrorContext(&e).to_string();
            if e.into_service_error().is_no_such_bucket() {
                StoreError::NotFound(format!("container {container}"))
            } else {
                StoreError::Unavailable(format!("list failed for {container}: {context}"))
            }
        })?;

        let objects = resp
            .contents()
            .iter()
            .filter_map(|obj| {
                let name = obj.key()?;
                Some(RemoteObject {
                    name: name.to_string(),
                    etag: obj.e_tag().map(normalize_etag).unwrap_or_default(),
                    size_bytes: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().and_then(to_chrono),
                    locator: locator(container, name),
                })
            })
            .collect::<Vec<_>>();

        let continuation = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!(
            "listed {} objects in s3://{container} (more: {})",
            objects.len(),
            continuation.is_some()
        );
        Ok(ObjectPage {
            objects,
            continuation,
        })
    }

    async fn head(&self, container: &str, name: &str) -> StoreResult<RemoteObject> {
        let resp = self
            .client
            .head_object()
            .bucket(container)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                let context = DisplayErrorContext(&e).to_string();
                if e.into_service_error().is_not_found() {
                    StoreError::NotFound(locator(container, name))
                } else {
                    StoreError::Unavailable(format!("head object failed for {name}: {context}"))
                }
            })?;

        Ok(RemoteObject {
            name: name.to_string(),
            etag: resp.e_tag().map(normalize_etag).unwrap_or_default(),
            size_bytes: resp.content_length().unwrap_or(0).max(0) as u64,
            last_modified: resp.last_modified().and_then(to_chrono),
            locator: locator(container, name),
        })
    }

    async fn download_to(&self, container: &str, name: &str, path: &Path) -> StoreResult<u64> {
        let resp = self
            .client
            .get_object()
            .bucket(container)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                let context = DisplayErrorContext(&e).to_string();
                if e.into_service_error().is_no_such_key() {
                    StoreError::NotFound(locator(container, name))
                } else {
                    StoreError::Unavailable(format!("download failed for {name}: {context}"))
                }
            })?;

        let part = partial_path(path);
        let mut file = tokio::fs::File::create(&part).await?;
        let mut body = resp.body;
        let mut written = 0u64;

        loop {
            let chunk = match body.try_next().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&part).await;
                    return Err(StoreError::Unavailable(format!(
                        "failed to read body for {name}: {e}"
                    )));
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&part, path).await?;

        debug!("downloaded {written} bytes from s3://{container}/{name}");
        Ok(written)
    }
}

//! Connection descriptor for the remote object store.
//!
//! Descriptors are `;`-separated `Key=Value` pairs, for example:
//!
//! ```text
//! Region=us-east-1;Endpoint=http://localhost:9000;AccessKeyId=minio;SecretAccessKey=minio123
//! ```
//!
//! Keys are matched case-insensitively. Omitting the access key pair falls
//! back to the default AWS credential chain.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default retry budget for a single store request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Parsed connection info for an S3-compatible store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// AWS region (required even for MinIO, which ignores it).
    pub region: String,

    /// Optional endpoint override. Enables path-style addressing.
    pub endpoint: Option<String>,

    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,

    /// Attempts per request, including the first, under standard backoff.
    pub max_attempts: u32,
}

impl ConnectionInfo {
    /// Connection to an AWS region using the default credential chain.
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Returns true if static credentials were supplied.
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    fn validate(&self) -> StoreResult<()> {
        if self.region.trim().is_empty() {
            return Err(StoreError::InvalidConnection("missing Region".into()));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(StoreError::InvalidConnection(
                "AccessKeyId and SecretAccessKey must be given together".into(),
            ));
        }
        if self.session_token.is_some() && !self.has_static_credentials() {
            return Err(StoreError::InvalidConnection(
                "SessionToken requires AccessKeyId and SecretAccessKey".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(StoreError::InvalidConnection("MaxAttempts must be at least 1".into()));
        }
        Ok(())
    }
}

impl FromStr for ConnectionInfo {
    type Err = StoreError;

    fn from_str(descriptor: &str) -> StoreResult<Self> {
        let mut region = None;
        let mut info = ConnectionInfo::for_region(String::new());

        for segment in descriptor.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                StoreError::InvalidConnection(format!("segment without '=': {segment}"))
            })?;
            let value = value.trim();
            if value.is_empty() {
                return Err(StoreError::InvalidConnection(format!("empty value for {key}")));
            }

            match key.trim().to_ascii_lowercase().as_str() {
                "region" => region = Some(value.to_string()),
                "endpoint" => info.endpoint = Some(value.to_string()),
                "accesskeyid" => info.access_key_id = Some(value.to_string()),
                "secretaccesskey" => info.secret_access_key = Some(value.to_string()),
                "sessiontoken" => info.session_token = Some(value.to_string()),
                "maxattempts" => {
                    info.max_attempts = value.parse().map_err(|_| {
                        StoreError::InvalidConnection(format!("MaxAttempts is not a number: {value}"))
                    })?;
                }
                other => {
                    return Err(StoreError::InvalidConnection(format!("unknown key: {other}")));
                }
            }
        }

        info.region = region.unwrap_or_default();
        info.validate()?;
        Ok(info)
    }
}

// Secrets stay out of logs.
impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

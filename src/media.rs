//! Media collaborators — resolving media ids to URLs and archiving the
//! original bytes to blob storage.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::PipelineError;

/// Resolves a channel media id to a fetchable URL.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, media_id: &str) -> Result<String, PipelineError>;
}

/// Persists the original media under a destination key.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, url: &str, key: &str) -> Result<(), PipelineError>;
}

// ── Graph API resolver ──────────────────────────────────────────────

/// Resolves media ids through the WhatsApp Graph API.
///
/// `GET {base}/{media_id}` with the bearer token returns `{"url": ...}`;
/// the returned URL is short-lived.
pub struct GraphMediaResolver {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl GraphMediaResolver {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }
}

#[derive(serde::Deserialize)]
struct MediaUrlResponse {
    url: String,
}

#[async_trait]
impl MediaResolver for GraphMediaResolver {
    async fn resolve(&self, media_id: &str) -> Result<String, PipelineError> {
        let unavailable = |reason: String| PipelineError::MediaUnavailable {
            media_id: media_id.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(format!("{}/{media_id}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(unavailable(format!("Graph API returned {}", resp.status())));
        }

        let body: MediaUrlResponse = resp.json().await.map_err(|e| unavailable(e.to_string()))?;
        debug!(media_id, "Resolved media URL");
        Ok(body.url)
    }
}

// ── S3 uploader ─────────────────────────────────────────────────────

/// Archives media to an S3 bucket.
///
/// Downloads the resolved URL (the channel requires the same bearer token)
/// and puts the bytes at the destination key.
pub struct S3MediaUploader {
    s3: aws_sdk_s3::Client,
    http: reqwest::Client,
    bucket: String,
    token: SecretString,
}

impl S3MediaUploader {
    pub fn new(
        s3: aws_sdk_s3::Client,
        http: reqwest::Client,
        bucket: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            s3,
            http,
            bucket: bucket.into(),
            token,
        }
    }
}

#[async_trait]
impl MediaUploader for S3MediaUploader {
    async fn upload(&self, url: &str, key: &str) -> Result<(), PipelineError> {
        let failed = |reason: String| PipelineError::UploadFailed {
            key: key.to_string(),
            reason,
        };

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| failed(format!("media download failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(failed(format!("media download returned {}", resp.status())));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| failed(format!("media body read failed: {e}")))?;

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| failed(format!("S3 put failed: {e}")))?;

        debug!(key, bucket = %self.bucket, size = bytes.len(), "Archived media to S3");
        Ok(())
    }
}

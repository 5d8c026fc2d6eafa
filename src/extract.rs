//! Extraction collaborators — turn raw message content into structured
//! order fragments via external services.

use async_trait::async_trait;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::ExtractedRecord;

/// Content extraction services, one method per message kind.
///
/// Image extraction may return several records: one photo can depict
/// multiple distinct orders. Text and audio yield exactly one.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_text(&self, input: &str) -> Result<ExtractedRecord, PipelineError>;
    async fn extract_image(&self, url: &str) -> Result<Vec<ExtractedRecord>, PipelineError>;
    async fn extract_audio(&self, url: &str) -> Result<ExtractedRecord, PipelineError>;
}

/// HTTP-backed extractor hitting three configurable endpoints.
pub struct HttpExtractor {
    client: reqwest::Client,
    text_url: String,
    image_url: String,
    audio_url: String,
    tenant: String,
}

impl HttpExtractor {
    pub fn new(
        client: reqwest::Client,
        text_url: impl Into<String>,
        image_url: impl Into<String>,
        audio_url: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            client,
            text_url: text_url.into(),
            image_url: image_url.into(),
            audio_url: audio_url.into(),
            tenant: tenant.into(),
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        kind: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, PipelineError> {
        let failed = |reason: String| PipelineError::ExtractionFailed {
            kind: kind.to_string(),
            reason,
        };

        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(failed(format!("extractor returned {}", resp.status())));
        }

        resp.json().await.map_err(|e| failed(format!("malformed response: {e}")))
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract_text(&self, input: &str) -> Result<ExtractedRecord, PipelineError> {
        debug!("Extracting text content");
        let body = serde_json::json!({ "id": self.tenant, "input": input });
        self.post_json("text", &self.text_url, &body).await
    }

    async fn extract_image(&self, url: &str) -> Result<Vec<ExtractedRecord>, PipelineError> {
        debug!(url, "Extracting image content");
        let body = serde_json::json!({ "url": url });
        self.post_json("image", &self.image_url, &body).await
    }

    async fn extract_audio(&self, url: &str) -> Result<ExtractedRecord, PipelineError> {
        debug!(url, "Extracting audio content");
        let body = serde_json::json!({ "url": url });
        self.post_json("audio", &self.audio_url, &body).await
    }
}

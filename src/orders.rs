//! Order submission collaborator.

use async_trait::async_trait;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::OrderPayload;

/// Downstream sink receiving assembled order batches.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit(&self, payloads: &[OrderPayload]) -> Result<(), PipelineError>;
}

/// HTTP order sink posting batches to the order API.
pub struct HttpOrderSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderSink {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderSink for HttpOrderSink {
    async fn submit(&self, payloads: &[OrderPayload]) -> Result<(), PipelineError> {
        let resp = self
            .client
            .post(format!("{}/order", self.base_url))
            .json(payloads)
            .send()
            .await
            .map_err(|e| PipelineError::SubmissionFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PipelineError::SubmissionFailed(format!(
                "order endpoint returned {}",
                resp.status()
            )));
        }

        debug!(count = payloads.len(), "Submitted order batch");
        Ok(())
    }
}

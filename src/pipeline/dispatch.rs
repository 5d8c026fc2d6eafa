//! Extraction dispatcher — converts an inbound message into extracted
//! records by delegating to the kind-appropriate collaborator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::media::{MediaResolver, MediaUploader};
use crate::pipeline::types::{Dispatched, InboundMessage, MessageContent, ResolvedContent};

/// Dispatches a message to the right extraction collaborator.
///
/// For media messages the original bytes are archived before extraction;
/// a failed archive aborts the message rather than silently proceeding
/// into order assembly with partial data.
pub struct ExtractionDispatcher {
    resolver: Arc<dyn MediaResolver>,
    uploader: Arc<dyn MediaUploader>,
    extractor: Arc<dyn Extractor>,
}

impl ExtractionDispatcher {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        uploader: Arc<dyn MediaUploader>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            resolver,
            uploader,
            extractor,
        }
    }

    /// Run extraction for one message.
    ///
    /// Any collaborator failure propagates and aborts this message's
    /// pipeline. An unrecognized message kind yields an empty record list
    /// without error.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<Dispatched, PipelineError> {
        match &message.content {
            MessageContent::Text { body } => {
                info!(id = %message.id, "Extracting text message");
                let record = self.extractor.extract_text(body).await?;
                Ok(Dispatched {
                    records: vec![record],
                    content: ResolvedContent::Text { body: body.clone() },
                })
            }
            MessageContent::Image { caption, media_id } => {
                info!(id = %message.id, media_id = %media_id, "Extracting image message");
                let url = self.resolve_and_archive(media_id).await?;
                let records = self.extractor.extract_image(&url).await?;
                info!(
                    id = %message.id,
                    records = records.len(),
                    "Image extraction complete"
                );
                Ok(Dispatched {
                    records,
                    content: ResolvedContent::Image {
                        caption: caption.clone(),
                        media_id: media_id.clone(),
                        url,
                    },
                })
            }
            MessageContent::Audio { media_id } => {
                info!(id = %message.id, media_id = %media_id, "Extracting audio message");
                let url = self.resolve_and_archive(media_id).await?;
                let record = self.extractor.extract_audio(&url).await?;
                Ok(Dispatched {
                    records: vec![record],
                    content: ResolvedContent::Audio {
                        media_id: media_id.clone(),
                        url,
                    },
                })
            }
            MessageContent::Unsupported { kind } => {
                debug!(id = %message.id, kind = %kind, "Unsupported message kind, skipping");
                Ok(Dispatched {
                    records: vec![],
                    content: ResolvedContent::None,
                })
            }
        }
    }

    /// Resolve a media id to a URL and archive the original bytes.
    async fn resolve_and_archive(&self, media_id: &str) -> Result<String, PipelineError> {
        let url = self.resolver.resolve(media_id).await?;
        self.uploader.upload(&url, &format!("media/{media_id}")).await?;
        Ok(url)
    }
}

//! Pipeline coordinator — sequences one inbound message end-to-end:
//! dispatch → assembly → submission.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::catalog::{CatalogFeed, CatalogIndex, SharedCatalog};
use crate::error::{CatalogError, PipelineError};
use crate::orders::OrderSink;
use crate::pipeline::assembler::OrderAssembler;
use crate::pipeline::dispatch::ExtractionDispatcher;
use crate::pipeline::types::{InboundMessage, OrderPayload};

/// Owns the catalog handle and sequences the pipeline for each message.
///
/// Each in-flight message runs independently; the catalog index is the
/// only shared state and lookups read a consistent snapshot.
pub struct PipelineCoordinator {
    catalog: SharedCatalog,
    dispatcher: ExtractionDispatcher,
    assembler: OrderAssembler,
    orders: Arc<dyn OrderSink>,
    feed: Arc<dyn CatalogFeed>,
}

impl PipelineCoordinator {
    pub fn new(
        catalog: SharedCatalog,
        dispatcher: ExtractionDispatcher,
        assembler: OrderAssembler,
        orders: Arc<dyn OrderSink>,
        feed: Arc<dyn CatalogFeed>,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            assembler,
            orders,
            feed,
        }
    }

    /// Process one inbound message.
    ///
    /// A dispatch failure short-circuits: no assembly, no submission, the
    /// error surfaces to the transport boundary. Submission itself is
    /// fire-and-forget — a failed submit is logged, never retried, and the
    /// assembled payloads are still returned.
    pub async fn process_inbound(
        &self,
        message: &InboundMessage,
    ) -> Result<Vec<OrderPayload>, PipelineError> {
        info!(
            id = %message.id,
            kind = message.content.kind(),
            from = %message.from_phone,
            "Processing inbound message"
        );

        let dispatched = self.dispatcher.dispatch(message).await?;

        let index = self.catalog.snapshot().await;
        let payloads: Vec<OrderPayload> = dispatched
            .records
            .into_iter()
            .map(|record| self.assembler.assemble(&index, message, &dispatched.content, record))
            .collect();

        if payloads.is_empty() {
            debug!(id = %message.id, "No records extracted, nothing to submit");
            return Ok(payloads);
        }

        if let Err(e) = self.orders.submit(&payloads).await {
            error!(id = %message.id, error = %e, "Order submission failed");
        } else {
            info!(id = %message.id, orders = payloads.len(), "Order batch submitted");
        }

        Ok(payloads)
    }

    /// Refetch the catalog feed and rebuild the index wholesale.
    ///
    /// Returns the number of entries in the new index.
    pub async fn refresh_catalog(&self) -> Result<usize, CatalogError> {
        let entries = self.feed.fetch().await?;
        let count = entries.len();
        self.catalog.replace(CatalogIndex::build(entries)).await;
        Ok(count)
    }
}

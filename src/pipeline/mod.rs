//! Extraction-to-order pipeline: dispatch, assembly, coordination.

pub mod assembler;
pub mod coordinator;
pub mod dispatch;
pub mod types;

pub use assembler::OrderAssembler;
pub use coordinator::PipelineCoordinator;
pub use dispatch::ExtractionDispatcher;
pub use types::{
    Dispatched, ExtractedRecord, InboundMessage, LineItem, MessageContent, OrderPayload,
    ResolvedContent,
};

//! Error types for order-intake.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Catalog feed errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog feed request failed: {0}")]
    FeedFailed(String),

    #[error("Catalog feed returned malformed data: {0}")]
    MalformedFeed(String),
}

/// Channel-related errors (webhook parsing, outbound sends).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to send outbound message to {to}: {reason}")]
    SendFailed { to: String, reason: String },
}

/// Pipeline errors — each aborts the current message's pipeline.
///
/// An unresolved product name is deliberately not represented here: a lookup
/// miss is a normal outcome, recovered locally by the assembler (the line
/// contributes nothing to the total and the miss is logged).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Media {media_id} unavailable: {reason}")]
    MediaUnavailable { media_id: String, reason: String },

    #[error("Upload of {key} failed: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("Extraction failed for {kind} content: {reason}")]
    ExtractionFailed { kind: String, reason: String },

    #[error("Order submission failed: {0}")]
    SubmissionFailed(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

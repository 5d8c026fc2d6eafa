//! Shared types for the extraction-to-order pipeline.

use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// One inbound chat message, already parsed out of the webhook envelope.
///
/// Transient: the pipeline never persists it.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Channel-native message id.
    pub id: String,
    /// Sender's display name from the contact profile.
    pub from_name: String,
    /// Sender's phone / channel id.
    pub from_phone: String,
    /// Channel timestamp, seconds since epoch.
    pub timestamp: i64,
    /// Kind-specific content.
    pub content: MessageContent,
}

/// Message content by kind. Unrecognized kinds are carried so the
/// dispatcher can skip them without failing.
#[derive(Debug, Clone)]
pub enum MessageContent {
    Text { body: String },
    Image { caption: String, media_id: String },
    Audio { media_id: String },
    Unsupported { kind: String },
}

impl MessageContent {
    /// Short label for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
            Self::Unsupported { kind } => kind,
        }
    }
}

// ── Extracted records ───────────────────────────────────────────────

/// One candidate order produced by an extraction service.
///
/// Unknown fields from the extractor are preserved through to the order
/// payload via `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Line items mentioned in the message.
    #[serde(default)]
    pub product: Vec<LineItem>,
    /// Sender name stated inside the content, overriding the contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_phone: Option<String>,
    /// Order date as stated in the content, when the extractor found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_day: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One product-name/quantity pair. Resolution fields are filled by the
/// assembler on a catalog match and stay absent for unresolved lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name as extracted, free text.
    pub name: String,
    pub quantity: f64,
    /// Catalog id of the matched product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zh_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en_name: Option<String>,
    #[serde(rename = "unitPrice", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(
        rename = "subtotalPrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal_price: Option<f64>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            key: None,
            full_name: None,
            zh_name: None,
            en_name: None,
            unit_price: None,
            subtotal_price: None,
        }
    }
}

// ── Dispatch result ─────────────────────────────────────────────────

/// What the dispatcher learned about a message: the extracted records and
/// the resolved kind-specific content carried onto every payload.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub records: Vec<ExtractedRecord>,
    pub content: ResolvedContent,
}

/// Kind-specific content after media resolution.
#[derive(Debug, Clone)]
pub enum ResolvedContent {
    Text {
        body: String,
    },
    Image {
        caption: String,
        media_id: String,
        url: String,
    },
    Audio {
        media_id: String,
        url: String,
    },
    /// Unrecognized message kind — nothing was extracted.
    None,
}

// ── Order payload ───────────────────────────────────────────────────

/// Finalized, priced order record handed to the submission collaborator.
///
/// Kind-specific fields serialize as empty strings when irrelevant — the
/// downstream order API expects the flat shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayload {
    pub driver: String,
    #[serde(rename = "fromName")]
    pub from_name: String,
    #[serde(rename = "fromPhone")]
    pub from_phone: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub caption: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "audioUrl", default)]
    pub audio_url: String,
    #[serde(rename = "mediaId", default)]
    pub media_id: String,
    /// Seconds since epoch: the order date stated in the content when
    /// complete, else the message's own timestamp.
    pub timestamp: i64,
    /// Sum of resolved line subtotals. Absent when the record had no
    /// line items.
    #[serde(rename = "totalPrice", default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    /// The extracted record, with resolution fields attached, kept for
    /// traceability.
    pub extracted: ExtractedRecord,
}

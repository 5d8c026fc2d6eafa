//! WhatsApp Business channel — webhook payload model, inbound message
//! parsing, and the outbound text sender.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::pipeline::types::{InboundMessage, MessageContent};

// ── Webhook payload model ───────────────────────────────────────────

/// Top-level webhook delivery: `entry → changes → value → messages`.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WaMessage>,
    #[serde(default)]
    pub contacts: Vec<WaContact>,
}

#[derive(Debug, Deserialize)]
pub struct WaMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<WaText>,
    pub image: Option<WaMedia>,
    pub audio: Option<WaMedia>,
}

#[derive(Debug, Deserialize)]
pub struct WaText {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct WaMedia {
    pub id: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Deserialize)]
pub struct WaContact {
    #[serde(default)]
    pub wa_id: String,
    pub profile: Option<WaProfile>,
}

#[derive(Debug, Deserialize)]
pub struct WaProfile {
    #[serde(default)]
    pub name: String,
}

/// Parse the first message of a webhook delivery into an [`InboundMessage`].
///
/// The sender identity comes from the contact profile, falling back to the
/// message's own `from` field. A kind with a missing body (e.g. `"text"`
/// without a text object) is rejected; an unrecognized kind is carried as
/// `Unsupported` so the pipeline can skip it without failing.
pub fn parse_inbound(payload: &WebhookPayload) -> Result<InboundMessage, ChannelError> {
    let value = payload
        .entry
        .first()
        .and_then(|e| e.changes.first())
        .map(|c| &c.value)
        .ok_or_else(|| ChannelError::InvalidPayload("no changes in webhook entry".into()))?;

    let message = value
        .messages
        .first()
        .ok_or_else(|| ChannelError::InvalidPayload("message missing".into()))?;

    let contact = value.contacts.first();
    let from_name = contact
        .and_then(|c| c.profile.as_ref())
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let from_phone = contact
        .map(|c| c.wa_id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| message.from.clone());

    let timestamp = message.timestamp.parse().unwrap_or_else(|_| {
        warn!(raw = %message.timestamp, "Unparseable webhook timestamp, using 0");
        0
    });

    let content = match message.kind.as_str() {
        "text" => {
            let body = message
                .text
                .as_ref()
                .map(|t| t.body.clone())
                .ok_or_else(|| ChannelError::InvalidPayload("text message without body".into()))?;
            MessageContent::Text { body }
        }
        "image" => {
            let image = message
                .image
                .as_ref()
                .ok_or_else(|| ChannelError::InvalidPayload("image message without media".into()))?;
            MessageContent::Image {
                caption: image.caption.clone(),
                media_id: image.id.clone(),
            }
        }
        "audio" => {
            let audio = message
                .audio
                .as_ref()
                .ok_or_else(|| ChannelError::InvalidPayload("audio message without media".into()))?;
            MessageContent::Audio {
                media_id: audio.id.clone(),
            }
        }
        other => MessageContent::Unsupported { kind: other.into() },
    };

    Ok(InboundMessage {
        id: message.id.clone(),
        from_name,
        from_phone,
        timestamp,
        content,
    })
}

// ── Outbound sender ─────────────────────────────────────────────────

/// Sends messages back out through the channel.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), ChannelError>;
}

/// WhatsApp Graph API text sender.
pub struct WhatsAppSender {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    token: SecretString,
}

impl WhatsAppSender {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        phone_number_id: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            phone_number_id: phone_number_id.into(),
            token,
        }
    }
}

#[async_trait]
impl OutboundSender for WhatsAppSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        let send_failed = |reason: String| ChannelError::SendFailed {
            to: to.to_string(),
            reason,
        };

        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let resp = self
            .client
            .post(format!("{}/{}/messages", self.base_url, self.phone_number_id))
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| send_failed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(send_failed(format!("sendMessage returned {status}: {detail}")));
        }

        debug!(to, "Sent outbound message");
        Ok(())
    }
}

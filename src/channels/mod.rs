//! Messaging channel adapters.

pub mod whatsapp;

pub use whatsapp::{OutboundSender, WebhookPayload, WhatsAppSender, parse_inbound};

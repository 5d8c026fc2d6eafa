//! Order assembler — resolves extracted line items against the catalog
//! and produces the final priced order payload.

use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use crate::catalog::CatalogIndex;
use crate::pipeline::types::{
    ExtractedRecord, InboundMessage, OrderPayload, ResolvedContent,
};

/// Turns one extracted record into one order payload.
pub struct OrderAssembler {
    driver: String,
}

impl OrderAssembler {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
        }
    }

    /// Assemble one payload.
    ///
    /// Each line item is resolved through the catalog index; a match
    /// contributes `quantity * unitPrice` to the order total, a miss is
    /// logged and contributes nothing. One unmatched line never fails the
    /// order. Assembly is all-or-nothing per record — the payload is built
    /// in one pass and never mutated afterwards.
    pub fn assemble(
        &self,
        index: &CatalogIndex,
        message: &InboundMessage,
        content: &ResolvedContent,
        mut record: ExtractedRecord,
    ) -> OrderPayload {
        let total_price = if record.product.is_empty() {
            None
        } else {
            let mut total = 0.0;
            for line in &mut record.product {
                match index.lookup(&line.name) {
                    Some(found) => {
                        let subtotal = line.quantity * found.price;
                        total += subtotal;
                        line.key = Some(found.id.clone());
                        line.full_name = Some(found.full_name.clone());
                        line.zh_name = Some(found.zh_name.clone());
                        line.en_name = Some(found.en_name.clone());
                        line.unit_price = Some(found.price);
                        line.subtotal_price = Some(subtotal);
                        debug!(
                            name = %line.name,
                            key = %found.id,
                            subtotal,
                            "Resolved line item"
                        );
                    }
                    None => {
                        // Normal outcome for mis-transcribed or unknown
                        // names; flagged for manual reconciliation.
                        warn!(name = %line.name, "Product not found in catalog");
                    }
                }
            }
            Some(total)
        };

        let timestamp = derive_timestamp(&record).unwrap_or(message.timestamp);

        let from_name = record
            .sender_name
            .clone()
            .unwrap_or_else(|| message.from_name.clone());
        let from_phone = record
            .sender_phone
            .clone()
            .unwrap_or_else(|| message.from_phone.clone());

        let mut payload = OrderPayload {
            driver: self.driver.clone(),
            from_name,
            from_phone,
            text: String::new(),
            caption: String::new(),
            image_url: String::new(),
            audio_url: String::new(),
            media_id: String::new(),
            timestamp,
            total_price,
            extracted: record,
        };

        match content {
            ResolvedContent::Text { body } => payload.text = body.clone(),
            ResolvedContent::Image {
                caption,
                media_id,
                url,
            } => {
                payload.caption = caption.clone();
                payload.media_id = media_id.clone();
                payload.image_url = url.clone();
            }
            ResolvedContent::Audio { media_id, url } => {
                payload.media_id = media_id.clone();
                payload.audio_url = url.clone();
            }
            ResolvedContent::None => {}
        }

        payload
    }
}

/// Epoch seconds for the record's stated order date, at UTC midnight.
///
/// Requires all three date fields; an incomplete or invalid calendar date
/// falls back to the message timestamp.
fn derive_timestamp(record: &ExtractedRecord) -> Option<i64> {
    let (year, month, day) = (record.date_year?, record.date_month?, record.date_day?);
    match Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() {
        Some(dt) => Some(dt.timestamp()),
        None => {
            warn!(year, month, day, "Extracted date is not a valid calendar date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::pipeline::types::{LineItem, MessageContent};

    fn index() -> CatalogIndex {
        CatalogIndex::build(vec![
            CatalogEntry {
                id: "1".into(),
                full_name: "牛肉麵 Beef Noodles".into(),
                zh_name: "牛肉麵".into(),
                en_name: "Beef Noodles".into(),
                tag: "noodle beef".into(),
                price: 12.0,
            },
            CatalogEntry {
                id: "2".into(),
                full_name: "排骨飯 Pork Chop Rice".into(),
                zh_name: "排骨飯".into(),
                en_name: "Pork Chop Rice".into(),
                tag: "rice".into(),
                price: 10.0,
            },
        ])
    }

    fn message() -> InboundMessage {
        InboundMessage {
            id: "wamid.1".into(),
            from_name: "Alice".into(),
            from_phone: "60123456789".into(),
            timestamp: 1_700_000_000,
            content: MessageContent::Text { body: "order".into() },
        }
    }

    fn record(lines: Vec<LineItem>) -> ExtractedRecord {
        ExtractedRecord {
            product: lines,
            ..Default::default()
        }
    }

    fn assembler() -> OrderAssembler {
        OrderAssembler::new("Bruce Lee")
    }

    #[test]
    fn fuzzy_variant_resolves_and_prices() {
        // Simplified-character variant of the catalog name, within the
        // one-edit tolerance for a three-char query.
        let content = ResolvedContent::Text { body: "order".into() };
        let payload = assembler().assemble(
            &index(),
            &message(),
            &content,
            record(vec![LineItem::new("牛肉面", 2.0)]),
        );

        assert_eq!(payload.total_price, Some(24.0));
        let line = &payload.extracted.product[0];
        assert_eq!(line.key.as_deref(), Some("1"));
        assert_eq!(line.unit_price, Some(12.0));
        assert_eq!(line.subtotal_price, Some(24.0));
        assert_eq!(line.zh_name.as_deref(), Some("牛肉麵"));
    }

    #[test]
    fn total_is_sum_of_resolved_subtotals() {
        let content = ResolvedContent::Text { body: "order".into() };
        let payload = assembler().assemble(
            &index(),
            &message(),
            &content,
            record(vec![
                LineItem::new("牛肉麵", 2.0),
                LineItem::new("排骨飯", 3.0),
            ]),
        );
        assert_eq!(payload.total_price, Some(2.0 * 12.0 + 3.0 * 10.0));
    }

    #[test]
    fn unresolved_line_contributes_nothing() {
        let content = ResolvedContent::Text { body: "order".into() };
        let payload = assembler().assemble(
            &index(),
            &message(),
            &content,
            record(vec![
                LineItem::new("牛肉麵", 1.0),
                LineItem::new("pizza margherita", 4.0),
            ]),
        );

        assert_eq!(payload.total_price, Some(12.0));
        let unresolved = &payload.extracted.product[1];
        assert!(unresolved.key.is_none());
        assert!(unresolved.subtotal_price.is_none());
    }

    #[test]
    fn all_lines_unresolved_still_produces_payload() {
        let content = ResolvedContent::Text { body: "order".into() };
        let payload = assembler().assemble(
            &index(),
            &message(),
            &content,
            record(vec![LineItem::new("unknown thing", 2.0)]),
        );
        // Submit-always with a partial (here zero) total.
        assert_eq!(payload.total_price, Some(0.0));
    }

    #[test]
    fn empty_line_items_skip_pricing() {
        let content = ResolvedContent::Text { body: "hello".into() };
        let payload = assembler().assemble(&index(), &message(), &content, record(vec![]));
        assert!(payload.total_price.is_none());
    }

    #[test]
    fn complete_date_fields_override_message_timestamp() {
        let content = ResolvedContent::Text { body: "order".into() };
        let mut rec = record(vec![LineItem::new("牛肉麵", 1.0)]);
        rec.date_year = Some(2023);
        rec.date_month = Some(5);
        rec.date_day = Some(1);

        let payload = assembler().assemble(&index(), &message(), &content, rec);
        // 2023-05-01T00:00:00Z
        assert_eq!(payload.timestamp, 1_682_899_200);
    }

    #[test]
    fn incomplete_date_fields_fall_back_to_message_timestamp() {
        let content = ResolvedContent::Text { body: "order".into() };
        let mut rec = record(vec![]);
        rec.date_year = Some(2023);
        rec.date_month = Some(5);

        let payload = assembler().assemble(&index(), &message(), &content, rec);
        assert_eq!(payload.timestamp, 1_700_000_000);
    }

    #[test]
    fn invalid_calendar_date_falls_back() {
        let content = ResolvedContent::Text { body: "order".into() };
        let mut rec = record(vec![]);
        rec.date_year = Some(2023);
        rec.date_month = Some(2);
        rec.date_day = Some(30);

        let payload = assembler().assemble(&index(), &message(), &content, rec);
        assert_eq!(payload.timestamp, 1_700_000_000);
    }

    #[test]
    fn record_sender_fields_override_contact() {
        let content = ResolvedContent::Text { body: "order".into() };
        let mut rec = record(vec![]);
        rec.sender_name = Some("Uncle Wong".into());
        rec.sender_phone = Some("60987654321".into());

        let payload = assembler().assemble(&index(), &message(), &content, rec);
        assert_eq!(payload.from_name, "Uncle Wong");
        assert_eq!(payload.from_phone, "60987654321");
    }

    #[test]
    fn missing_sender_fields_use_contact_identity() {
        let content = ResolvedContent::Text { body: "order".into() };
        let payload = assembler().assemble(&index(), &message(), &content, record(vec![]));
        assert_eq!(payload.from_name, "Alice");
        assert_eq!(payload.from_phone, "60123456789");
    }

    #[test]
    fn image_content_populates_only_image_fields() {
        let content = ResolvedContent::Image {
            caption: "lunch orders".into(),
            media_id: "m-1".into(),
            url: "https://cdn.example/m-1".into(),
        };
        let payload = assembler().assemble(&index(), &message(), &content, record(vec![]));
        assert_eq!(payload.caption, "lunch orders");
        assert_eq!(payload.media_id, "m-1");
        assert_eq!(payload.image_url, "https://cdn.example/m-1");
        assert!(payload.text.is_empty());
        assert!(payload.audio_url.is_empty());
    }

    #[test]
    fn audio_content_populates_only_audio_fields() {
        let content = ResolvedContent::Audio {
            media_id: "m-2".into(),
            url: "https://cdn.example/m-2".into(),
        };
        let payload = assembler().assemble(&index(), &message(), &content, record(vec![]));
        assert_eq!(payload.audio_url, "https://cdn.example/m-2");
        assert_eq!(payload.media_id, "m-2");
        assert!(payload.image_url.is_empty());
        assert!(payload.caption.is_empty());
    }
}

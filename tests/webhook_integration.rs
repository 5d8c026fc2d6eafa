//! End-to-end webhook tests: HTTP surface down to order submission,
//! with mocked external collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use order_intake::catalog::{CatalogEntry, CatalogFeed, CatalogIndex, SharedCatalog};
use order_intake::channels::OutboundSender;
use order_intake::error::{CatalogError, ChannelError, PipelineError};
use order_intake::extract::Extractor;
use order_intake::media::{MediaResolver, MediaUploader};
use order_intake::orders::OrderSink;
use order_intake::pipeline::types::{ExtractedRecord, LineItem, OrderPayload};
use order_intake::pipeline::{ExtractionDispatcher, OrderAssembler, PipelineCoordinator};
use order_intake::routes::{AppState, app_routes};

// ── Mock collaborators ──────────────────────────────────────────────

struct MockResolver;

#[async_trait]
impl MediaResolver for MockResolver {
    async fn resolve(&self, media_id: &str) -> Result<String, PipelineError> {
        Ok(format!("https://cdn.example/{media_id}"))
    }
}

struct MockUploader {
    fail: bool,
}

#[async_trait]
impl MediaUploader for MockUploader {
    async fn upload(&self, _url: &str, key: &str) -> Result<(), PipelineError> {
        if self.fail {
            Err(PipelineError::UploadFailed {
                key: key.into(),
                reason: "bucket down".into(),
            })
        } else {
            Ok(())
        }
    }
}

struct MockExtractor;

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract_text(&self, _input: &str) -> Result<ExtractedRecord, PipelineError> {
        Ok(ExtractedRecord {
            product: vec![LineItem::new("牛肉面", 2.0)],
            ..Default::default()
        })
    }

    async fn extract_image(&self, _url: &str) -> Result<Vec<ExtractedRecord>, PipelineError> {
        Ok(vec![ExtractedRecord::default(), ExtractedRecord::default()])
    }

    async fn extract_audio(&self, _url: &str) -> Result<ExtractedRecord, PipelineError> {
        Ok(ExtractedRecord::default())
    }
}

#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<OrderPayload>>>,
}

#[async_trait]
impl OrderSink for RecordingSink {
    async fn submit(&self, payloads: &[OrderPayload]) -> Result<(), PipelineError> {
        self.batches.lock().unwrap().push(payloads.to_vec());
        Ok(())
    }
}

struct StubFeed;

#[async_trait]
impl CatalogFeed for StubFeed {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(vec![beef_noodles()])
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl OutboundSender for RecordingSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push((to.into(), body.into()));
        Ok(())
    }
}

// ── Fixture ─────────────────────────────────────────────────────────

fn beef_noodles() -> CatalogEntry {
    CatalogEntry {
        id: "1".into(),
        full_name: "牛肉麵 Beef Noodles".into(),
        zh_name: "牛肉麵".into(),
        en_name: "Beef Noodles".into(),
        tag: "noodle".into(),
        price: 12.0,
    }
}

fn app_with(
    uploader_fails: bool,
    sink: Arc<RecordingSink>,
    sender: Arc<RecordingSender>,
) -> Router {
    let catalog = SharedCatalog::new(CatalogIndex::build(vec![beef_noodles()]));
    let dispatcher = ExtractionDispatcher::new(
        Arc::new(MockResolver),
        Arc::new(MockUploader { fail: uploader_fails }),
        Arc::new(MockExtractor),
    );
    let coordinator = Arc::new(PipelineCoordinator::new(
        catalog,
        dispatcher,
        OrderAssembler::new("Bruce Lee"),
        sink,
        Arc::new(StubFeed),
    ));
    app_routes(AppState {
        coordinator,
        sender,
        verify_token: "secret-token".into(),
    })
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn text_webhook_body() -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{"changes": [{"value": {
            "contacts": [{"wa_id": "60123456789", "profile": {"name": "Alice"}}],
            "messages": [{
                "id": "wamid.1",
                "timestamp": "1700000000",
                "type": "text",
                "text": {"body": "两碗牛肉面"}
            }]
        }}]}]
    })
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── Verification handshake ──────────────────────────────────────────

#[tokio::test]
async fn webhook_verification_echoes_challenge() {
    let app = app_with(false, Arc::default(), Arc::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=secret-token&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "12345");
}

#[tokio::test]
async fn webhook_verification_rejects_bad_token() {
    let app = app_with(false, Arc::default(), Arc::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ── Delivery ────────────────────────────────────────────────────────

#[tokio::test]
async fn text_delivery_assembles_and_submits_one_order() {
    let sink = Arc::new(RecordingSink::default());
    let app = app_with(false, sink.clone(), Arc::default());

    let response = app
        .oneshot(json_post("/webhook", text_webhook_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    let payload = &batches[0][0];
    // Fuzzy variant 牛肉面 resolved against 牛肉麵 at 12.0 each.
    assert_eq!(payload.total_price, Some(24.0));
    assert_eq!(payload.from_name, "Alice");
    assert_eq!(payload.text, "两碗牛肉面");
    assert_eq!(payload.driver, "Bruce Lee");
}

#[tokio::test]
async fn delivery_without_message_is_422() {
    let sink = Arc::new(RecordingSink::default());
    let app = app_with(false, sink.clone(), Arc::default());

    let body = serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{"changes": [{"value": {"contacts": []}}]}]
    });
    let response = app.oneshot(json_post("/webhook", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("message missing"));
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delivery_without_object_is_ignored() {
    let sink = Arc::new(RecordingSink::default());
    let app = app_with(false, sink.clone(), Arc::default());

    let response = app
        .oneshot(json_post("/webhook", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_failure_surfaces_as_422_with_no_submission() {
    let sink = Arc::new(RecordingSink::default());
    let app = app_with(true, sink.clone(), Arc::default());

    let body = serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{"changes": [{"value": {
            "contacts": [{"wa_id": "60123456789", "profile": {"name": "Alice"}}],
            "messages": [{
                "id": "wamid.2",
                "timestamp": "1700000000",
                "type": "image",
                "image": {"id": "m-1", "caption": "orders"}
            }]
        }}]}]
    });
    let response = app.oneshot(json_post("/webhook", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("Upload"));
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_kind_is_200_with_no_submission() {
    let sink = Arc::new(RecordingSink::default());
    let app = app_with(false, sink.clone(), Arc::default());

    let body = serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{"changes": [{"value": {
            "contacts": [{"wa_id": "60123456789", "profile": {"name": "Alice"}}],
            "messages": [{"id": "wamid.3", "timestamp": "1700000000", "type": "sticker"}]
        }}]}]
    });
    let response = app.oneshot(json_post("/webhook", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.batches.lock().unwrap().is_empty());
}

// ── Outbound + refresh ──────────────────────────────────────────────

#[tokio::test]
async fn messages_endpoint_sends_outbound_text() {
    let sender = Arc::new(RecordingSender::default());
    let app = app_with(false, Arc::default(), sender.clone());

    let body = serde_json::json!({"to": "60123456789", "body": "your order is confirmed"});
    let response = app.oneshot(json_post("/messages", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sent = sender.sent.lock().unwrap();
    assert_eq!(
        sent.as_slice(),
        [("60123456789".to_string(), "your order is confirmed".to_string())]
    );
}

#[tokio::test]
async fn catalog_refresh_reports_product_count() {
    let app = app_with(false, Arc::default(), Arc::default());

    let response = app
        .oneshot(json_post("/catalog/refresh", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["products"], 1);
}

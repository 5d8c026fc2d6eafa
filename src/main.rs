use std::sync::Arc;

use order_intake::catalog::{CatalogFeed, CatalogIndex, HttpCatalogFeed, SharedCatalog};
use order_intake::channels::{OutboundSender, WhatsAppSender};
use order_intake::config::AppConfig;
use order_intake::extract::HttpExtractor;
use order_intake::media::{GraphMediaResolver, S3MediaUploader};
use order_intake::orders::HttpOrderSink;
use order_intake::pipeline::{ExtractionDispatcher, OrderAssembler, PipelineCoordinator};
use order_intake::routes::{AppState, app_routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📦 order-intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   Order API: {}", config.order_api_base);
    eprintln!("   Media bucket: {}", config.media_bucket);

    let http = reqwest::Client::new();

    // ── Catalog ─────────────────────────────────────────────────────────
    let feed: Arc<dyn CatalogFeed> = Arc::new(HttpCatalogFeed::new(
        http.clone(),
        config.order_api_base.clone(),
    ));
    let entries = feed.fetch().await.unwrap_or_else(|e| {
        eprintln!("Error: failed to load product catalog: {e}");
        std::process::exit(1);
    });
    eprintln!("   Catalog: {} products", entries.len());
    let catalog = SharedCatalog::new(CatalogIndex::build(entries));

    // ── Collaborators ───────────────────────────────────────────────────
    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3 = aws_sdk_s3::Client::new(&aws);

    let dispatcher = ExtractionDispatcher::new(
        Arc::new(GraphMediaResolver::new(
            http.clone(),
            config.graph_api_base.clone(),
            config.whatsapp_token.clone(),
        )),
        Arc::new(S3MediaUploader::new(
            s3,
            http.clone(),
            config.media_bucket.clone(),
            config.whatsapp_token.clone(),
        )),
        Arc::new(HttpExtractor::new(
            http.clone(),
            config.text_extractor_url.clone(),
            config.image_extractor_url.clone(),
            config.audio_extractor_url.clone(),
            config.extractor_tenant.clone(),
        )),
    );

    let coordinator = Arc::new(PipelineCoordinator::new(
        catalog,
        dispatcher,
        OrderAssembler::new(config.driver_name.clone()),
        Arc::new(HttpOrderSink::new(http.clone(), config.order_api_base.clone())),
        feed,
    ));

    let sender: Arc<dyn OutboundSender> = Arc::new(WhatsAppSender::new(
        http,
        config.graph_api_base.clone(),
        config.phone_number_id.clone(),
        config.whatsapp_token.clone(),
    ));

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = app_routes(AppState {
        coordinator,
        sender,
        verify_token: config.verify_token.clone(),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

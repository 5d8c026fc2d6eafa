//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Service configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the webhook HTTP server.
    pub port: u16,
    /// Token expected on the GET /webhook verification handshake.
    pub verify_token: String,
    /// WhatsApp Graph API bearer token.
    pub whatsapp_token: SecretString,
    /// Phone number id used for outbound sends.
    pub phone_number_id: String,
    /// Graph API base URL (overridable for tests).
    pub graph_api_base: String,
    /// Text extraction service endpoint.
    pub text_extractor_url: String,
    /// Image extraction (OCR) service endpoint.
    pub image_extractor_url: String,
    /// Audio extraction (transcription) service endpoint.
    pub audio_extractor_url: String,
    /// Tenant id sent with text extraction requests.
    pub extractor_tenant: String,
    /// Order/product API base URL.
    pub order_api_base: String,
    /// S3 bucket receiving original media.
    pub media_bucket: String,
    /// Driver attribution stamped on every order payload.
    pub driver_name: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `VERIFY_TOKEN`, `WHATSAPP_TOKEN`, and `WA_PHONE_NUMBER_ID` are
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a valid port: {v}"),
            })?,
            Err(_) => 1337,
        };

        Ok(Self {
            port,
            verify_token: require_env("VERIFY_TOKEN")?,
            whatsapp_token: SecretString::from(require_env("WHATSAPP_TOKEN")?),
            phone_number_id: require_env("WA_PHONE_NUMBER_ID")?,
            graph_api_base: env_or("GRAPH_API_BASE", "https://graph.facebook.com/v15.0"),
            text_extractor_url: env_or(
                "TEXT_EXTRACTOR_URL",
                "https://aiyu-parse-text.junyaoc.repl.co/",
            ),
            image_extractor_url: env_or("IMAGE_EXTRACTOR_URL", "https://ocr.shaoye.org/"),
            audio_extractor_url: env_or(
                "AUDIO_EXTRACTOR_URL",
                "https://aiyu-whisper-fast.junyaoc.repl.co/",
            ),
            extractor_tenant: env_or("EXTRACTOR_TENANT", "shaoye2"),
            order_api_base: env_or("ORDER_API_BASE", "https://api.shaoye.org"),
            media_bucket: env_or("MEDIA_BUCKET", "aiyuworld"),
            driver_name: env_or("DRIVER_NAME", "Bruce Lee"),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

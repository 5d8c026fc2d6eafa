//! Catalog feed — fetches the product list from the order API.

use async_trait::async_trait;

use crate::catalog::CatalogEntry;
use crate::error::CatalogError;

/// Source of catalog entries, consumed at startup and on refresh.
#[async_trait]
pub trait CatalogFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// HTTP catalog feed backed by the order API's product endpoint.
pub struct HttpCatalogFeed {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogFeed {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Product feed wire shape: `{"documents": [{"id": ..., "value": {...}}]}`.
#[derive(serde::Deserialize)]
struct FeedResponse {
    #[serde(default)]
    documents: Vec<FeedDocument>,
}

#[derive(serde::Deserialize)]
struct FeedDocument {
    id: serde_json::Value,
    value: FeedValue,
}

#[derive(serde::Deserialize)]
struct FeedValue {
    #[serde(rename = "fullName", default)]
    full_name: String,
    #[serde(default)]
    zh_name: String,
    #[serde(default)]
    en_name: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    price: f64,
}

impl FeedDocument {
    fn into_entry(self) -> CatalogEntry {
        // Document ids arrive as strings or numbers depending on the feed.
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        CatalogEntry {
            id,
            full_name: self.value.full_name,
            zh_name: self.value.zh_name,
            en_name: self.value.en_name,
            tag: self.value.tag,
            price: self.value.price,
        }
    }
}

#[async_trait]
impl CatalogFeed for HttpCatalogFeed {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}/product", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::FeedFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CatalogError::FeedFailed(format!(
                "product endpoint returned {}",
                resp.status()
            )));
        }

        let feed: FeedResponse = resp
            .json()
            .await
            .map_err(|e| CatalogError::MalformedFeed(e.to_string()))?;

        Ok(feed.documents.into_iter().map(FeedDocument::into_entry).collect())
    }
}

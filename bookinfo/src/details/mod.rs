//! Details provider: bibliographic metadata, either canned or from an external book API.

pub mod google_books;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::Path;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Extension, Json, Router};
use client::types::BookDetails;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use tracing::instrument;

use crate::config::DetailsConfig;
use crate::error::ServiceError;
use crate::parse_product_id;

/// Budget for one call to the external book API.
const EXTERNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Inbound headers passed on to the details provider and from there to the book API.
pub const FORWARDED_HEADERS: [&str; 3] = ["x-request-id", "end-user", "user-agent"];

/// The subset of `headers` listed in [`FORWARDED_HEADERS`].
pub fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(name) {
            forwarded.insert(name, value.clone());
        }
    }
    forwarded
}

#[async_trait]
pub trait Details: Send + Sync {
    async fn get_book_details(
        &self,
        product_id: i64,
        headers: &HeaderMap,
    ) -> Result<BookDetails, ServiceError>;
}

/// Builds the provider selected by `config`.
pub fn from_config(config: &DetailsConfig) -> anyhow::Result<Arc<dyn Details>> {
    if config.external_enabled {
        tracing::info!(url = %config.external_url, isbn = %config.isbn, "Using external book service");
        Ok(Arc::new(ExternalDetails::new(config)?))
    } else {
        Ok(Arc::new(LocalDetails))
    }
}

/// The same record for every product, with the product id echoed back.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDetails;

impl LocalDetails {
    pub fn canonical(product_id: i64) -> BookDetails {
        BookDetails {
            id: product_id,
            author: "William Shakespeare".to_string(),
            year: 1595,
            kind: "paperback".to_string(),
            pages: 200,
            publisher: "PublisherA".to_string(),
            language: "English".to_string(),
            isbn_10: "1234567890".to_string(),
            isbn_13: "123-1234567890".to_string(),
        }
    }
}

#[async_trait]
impl Details for LocalDetails {
    #[instrument(skip(self, _headers))]
    async fn get_book_details(
        &self,
        product_id: i64,
        _headers: &HeaderMap,
    ) -> Result<BookDetails, ServiceError> {
        Ok(Self::canonical(product_id))
    }
}

/// Looks up a fixed ISBN in a Google Books compatible API.
pub struct ExternalDetails {
    http: ClientWithMiddleware,
    base_url: String,
    isbn: String,
}

impl ExternalDetails {
    pub fn new(config: &DetailsConfig) -> anyhow::Result<Self> {
        let http = client::traced_http_client(EXTERNAL_TIMEOUT)
            .context("Failed to build the book service client")?;
        Ok(Self {
            http,
            base_url: config.external_url.trim_end_matches('/').to_string(),
            isbn: config.isbn.clone(),
        })
    }
}

#[async_trait]
impl Details for ExternalDetails {
    #[instrument(skip(self, headers), fields(otel.kind = "client"))]
    async fn get_book_details(
        &self,
        product_id: i64,
        headers: &HeaderMap,
    ) -> Result<BookDetails, ServiceError> {
        tracing::debug!(isbn = %self.isbn, "Querying book service");
        let url = format!("{}/books/v1/volumes", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", format!("isbn:{}", self.isbn))])
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| {
                ServiceError::UpstreamFailure(format!("book service request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::UpstreamFailure(format!(
                "book service returned {status}"
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            ServiceError::UpstreamFailure(format!("book service returned an unreadable body: {e}"))
        })?;

        google_books::book_details(product_id, &payload)
    }
}

#[instrument(skip(details, headers))]
async fn get_details(
    Extension(details): Extension<Arc<dyn Details>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookDetails>, ServiceError> {
    let id = parse_product_id(&id)?;
    let details = details
        .get_book_details(id, &forwarded_headers(&headers))
        .await?;
    Ok(Json(details))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "Details is healthy" }))
}

/// Endpoints of a standalone details component.
pub fn details_service() -> Router {
    Router::new()
        .route("/details/:id", get(get_details))
        .route("/health", get(health))
}

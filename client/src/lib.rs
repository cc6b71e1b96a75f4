//! Typed HTTP client for the bookinfo component endpoints.
//!
//! Every request carries the caller's trace context, so a product page
//! request fanning out to details, reviews and ratings shows up as one trace.

mod otel;
pub mod types;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use tracing::instrument;

pub use otel::{inject_opentelemetry_context_into_request, TraceContextPropagation};
use types::{BookDetails, RatingResponse, ReviewsResponse};

/// Budget for a single call between components.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// The HTTP status the remote component answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The response body of a non-success answer.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds a reqwest client that traces each request and propagates trace context.
pub fn traced_http_client(timeout: Duration) -> Result<ClientWithMiddleware, reqwest::Error> {
    let reqwest_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(ClientBuilder::new(reqwest_client)
        // Creates a client span per request
        .with(TracingMiddleware::default())
        // Writes the traceparent header from the current span
        .with(TraceContextPropagation)
        .build())
}

/// Client for one bookinfo component, addressed by its base url.
#[derive(Clone)]
pub struct Client {
    http: ClientWithMiddleware,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let http = traced_http_client(DEFAULT_TIMEOUT).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Self::with_http_client(base_url, http)
    }

    pub fn with_http_client(base_url: &str, http: ClientWithMiddleware) -> Result<Self, Error> {
        let parsed = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base url".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(skip(self), fields(otel.kind = "client"))]
    pub async fn get_ratings(&self, product_id: i64) -> Result<RatingResponse, Error> {
        let url = self.url(&["ratings", &product_id.to_string()]);
        self.send(self.http.get(url.clone()), url).await
    }

    #[instrument(skip(self, body), fields(otel.kind = "client"))]
    pub async fn post_ratings(
        &self,
        product_id: &str,
        body: Vec<u8>,
    ) -> Result<RatingResponse, Error> {
        let url = self.url(&["ratings", product_id]);
        let request = self
            .http
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.send(request, url).await
    }

    #[instrument(skip(self), fields(otel.kind = "client"))]
    pub async fn book_reviews_by_id(&self, product_id: &str) -> Result<ReviewsResponse, Error> {
        let url = self.url(&["reviews", product_id]);
        self.send(self.http.get(url.clone()), url).await
    }

    #[instrument(skip(self, headers), fields(otel.kind = "client"))]
    pub async fn get_book_details(
        &self,
        product_id: i64,
        headers: HeaderMap,
    ) -> Result<BookDetails, Error> {
        let url = self.url(&["details", &product_id.to_string()]);
        self.send(self.http.get(url.clone()).headers(headers), url)
            .await
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base urls are rejected in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: Url) -> Result<T, Error> {
        let response = request.send().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%url, %status, "Component answered with an error");
            return Err(Error::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        response.json::<T>().await.map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

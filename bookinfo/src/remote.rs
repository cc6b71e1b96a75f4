//! Component implementations that call another bookinfo process over HTTP.

use async_trait::async_trait;
use axum::http::HeaderMap;
use client::types::{BookDetails, RatingResponse, ReviewsResponse};
use client::Client;
use tracing::instrument;

use crate::details::Details;
use crate::error::ServiceError;
use crate::ratings::Ratings;
use crate::reviews::Reviews;

/// Ratings served by a process running the `ratings` role.
#[derive(Clone)]
pub struct RemoteRatings {
    client: Client,
}

impl RemoteRatings {
    pub fn new(base_url: &str) -> Result<Self, client::Error> {
        Ok(Self {
            client: Client::new(base_url)?,
        })
    }
}

#[async_trait]
impl Ratings for RemoteRatings {
    #[instrument(skip(self))]
    async fn get_ratings(&self, product_id: i64) -> Result<RatingResponse, ServiceError> {
        Ok(self.client.get_ratings(product_id).await?)
    }

    #[instrument(skip(self, body))]
    async fn post_ratings(
        &self,
        product_id: &str,
        body: &[u8],
    ) -> Result<RatingResponse, ServiceError> {
        Ok(self.client.post_ratings(product_id, body.to_vec()).await?)
    }
}

/// Reviews served by a process running the `reviews` role.
#[derive(Clone)]
pub struct RemoteReviews {
    client: Client,
}

impl RemoteReviews {
    pub fn new(base_url: &str) -> Result<Self, client::Error> {
        Ok(Self {
            client: Client::new(base_url)?,
        })
    }
}

#[async_trait]
impl Reviews for RemoteReviews {
    #[instrument(skip(self))]
    async fn book_reviews_by_id(&self, product_id: &str) -> Result<ReviewsResponse, ServiceError> {
        Ok(self.client.book_reviews_by_id(product_id).await?)
    }
}

/// Details served by a process running the `details` role.
#[derive(Clone)]
pub struct RemoteDetails {
    client: Client,
}

impl RemoteDetails {
    pub fn new(base_url: &str) -> Result<Self, client::Error> {
        Ok(Self {
            client: Client::new(base_url)?,
        })
    }
}

#[async_trait]
impl Details for RemoteDetails {
    #[instrument(skip(self, headers))]
    async fn get_book_details(
        &self,
        product_id: i64,
        headers: &HeaderMap,
    ) -> Result<BookDetails, ServiceError> {
        Ok(self
            .client
            .get_book_details(product_id, headers.clone())
            .await?)
    }
}

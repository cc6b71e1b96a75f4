//! Ratings provider: per-product star counts keyed by reviewer.

pub mod availability;
pub mod db;
pub mod store;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use client::types::{RatingResponse, REVIEWER_1, REVIEWER_2};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument};

use crate::config::{RatingsConfig, RatingsMode};
use crate::error::ServiceError;
use crate::parse_product_id;
use availability::{Availability, Flapping};
use db::RatingsBackend;
use store::RatingsStore;

#[async_trait]
pub trait Ratings: Send + Sync {
    async fn get_ratings(&self, product_id: i64) -> Result<RatingResponse, ServiceError>;

    /// Stores `body`, a JSON object of reviewer to stars, as the ratings of the product.
    async fn post_ratings(
        &self,
        product_id: &str,
        body: &[u8],
    ) -> Result<RatingResponse, ServiceError>;

    fn is_healthy(&self) -> bool {
        true
    }
}

/// Ratings shown for products nobody has posted ratings for.
pub fn default_ratings(product_id: i64) -> RatingResponse {
    RatingResponse {
        id: product_id,
        ratings: BTreeMap::from([(REVIEWER_1.to_string(), 5), (REVIEWER_2.to_string(), 4)]),
    }
}

pub enum RatingsSource {
    Local,
    Database(Box<dyn RatingsBackend>),
}

pub struct RatingsService {
    store: Arc<dyn RatingsStore>,
    source: RatingsSource,
    availability: Option<Availability>,
}

impl RatingsService {
    pub fn new(store: Arc<dyn RatingsStore>, source: RatingsSource) -> Self {
        Self {
            store,
            source,
            availability: None,
        }
    }

    /// Gates `get_ratings` on the flags of `availability`.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Builds the service for `config.mode`. The simulated modes start their toggle task on
    /// `tasks`, running until `shutdown` is cancelled.
    pub async fn from_config(
        config: &RatingsConfig,
        store: Arc<dyn RatingsStore>,
        shutdown: &CancellationToken,
        tasks: &TaskTracker,
    ) -> anyhow::Result<Self> {
        let source = match config.mode {
            RatingsMode::Database => RatingsSource::Database(db::connect(&config.database).await?),
            _ => RatingsSource::Local,
        };
        let service = Self::new(store, source);

        Ok(match Flapping::for_mode(config.mode) {
            Some(flapping) => {
                info!(?flapping, "Simulating ratings flakiness");
                let availability = Availability::new();
                availability.spawn_toggler(flapping, shutdown.clone(), tasks);
                service.with_availability(availability)
            }
            None => service,
        })
    }

    async fn local_ratings(&self, product_id: i64) -> RatingResponse {
        match self.store.get(product_id).await {
            Some(ratings) => RatingResponse {
                id: product_id,
                ratings,
            },
            None => default_ratings(product_id),
        }
    }
}

#[async_trait]
impl Ratings for RatingsService {
    #[instrument(skip(self))]
    async fn get_ratings(&self, product_id: i64) -> Result<RatingResponse, ServiceError> {
        if let Some(availability) = &self.availability {
            if !availability.is_available() {
                return Err(ServiceError::Unavailable("service unavailable".to_string()));
            }
        }

        match &self.source {
            RatingsSource::Local => Ok(self.local_ratings(product_id).await),
            RatingsSource::Database(backend) => {
                let (first, second) = backend.first_two_ratings().await?;
                Ok(RatingResponse {
                    id: product_id,
                    ratings: BTreeMap::from([
                        (REVIEWER_1.to_string(), first),
                        (REVIEWER_2.to_string(), second),
                    ]),
                })
            }
        }
    }

    #[instrument(skip(self, body))]
    async fn post_ratings(
        &self,
        product_id: &str,
        body: &[u8],
    ) -> Result<RatingResponse, ServiceError> {
        let product_id: i64 = product_id.parse().map_err(|_| {
            ServiceError::InvalidInput("please provide numeric product ID".to_string())
        })?;
        let ratings: BTreeMap<String, i32> = serde_json::from_slice(body).map_err(|_| {
            ServiceError::InvalidInput("please provide valid ratings JSON".to_string())
        })?;

        if let RatingsSource::Database(_) = self.source {
            return Err(ServiceError::NotImplemented(
                "Post not implemented for database backed ratings".to_string(),
            ));
        }

        self.store.put(product_id, ratings).await;
        Ok(self.local_ratings(product_id).await)
    }

    fn is_healthy(&self) -> bool {
        self.availability
            .as_ref()
            .map_or(true, Availability::is_healthy)
    }
}

#[instrument(skip(ratings))]
async fn get_ratings(
    Extension(ratings): Extension<Arc<dyn Ratings>>,
    Path(id): Path<String>,
) -> Result<Json<RatingResponse>, ServiceError> {
    let id = parse_product_id(&id)?;
    Ok(Json(ratings.get_ratings(id).await?))
}

#[instrument(skip(ratings, body))]
async fn post_ratings(
    Extension(ratings): Extension<Arc<dyn Ratings>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<RatingResponse>, ServiceError> {
    Ok(Json(ratings.post_ratings(&id, &body).await?))
}

async fn health(
    Extension(ratings): Extension<Arc<dyn Ratings>>,
) -> (StatusCode, Json<serde_json::Value>) {
    if ratings.is_healthy() {
        (StatusCode::OK, Json(json!({ "status": "Ratings is healthy" })))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "Ratings is not healthy" })),
        )
    }
}

/// Endpoints of a standalone ratings component.
pub fn ratings_service() -> Router {
    Router::new()
        .route("/ratings/:id", get(get_ratings).post(post_ratings))
        .route("/health", get(health))
}

//! Bookinfo: a product page composed from details, reviews and ratings components.
//!
//! Every component sits behind a trait object, so a single process can host all of
//! them or reach some over HTTP through [`remote`] implementations.

pub mod config;
pub mod details;
pub mod error;
pub mod productpage;
pub mod ratings;
pub mod remote;
pub mod reviews;
pub mod tracing_config;


use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::{Config, Role};
use details::Details;
use error::ServiceError;
use productpage::catalog::Catalog;
use ratings::store::InMemoryRatingsStore;
use ratings::{Ratings, RatingsService};
use remote::{RemoteDetails, RemoteRatings, RemoteReviews};
use reviews::{Reviews, ReviewsService};

/// Parses the `{id}` path segment of the product routes.
pub fn parse_product_id(text: &str) -> Result<i64, ServiceError> {
    text.parse()
        .map_err(|_| ServiceError::InvalidInput("Invalid product ID".to_string()))
}

/// The component handles shared by all routers.
#[derive(Clone)]
pub struct Components {
    pub details: Arc<dyn Details>,
    pub reviews: Arc<dyn Reviews>,
    pub ratings: Arc<dyn Ratings>,
    pub catalog: Arc<Catalog>,
    /// Tasks the components run until the shutdown token is cancelled.
    pub background: TaskTracker,
}

impl Components {
    /// Wires in-process components, or remote ones where a component url is configured.
    pub async fn from_config(config: &Config, shutdown: &CancellationToken) -> anyhow::Result<Self> {
        let remote = &config.remote;
        let background = TaskTracker::new();

        let ratings: Arc<dyn Ratings> = match &remote.ratings_url {
            Some(url) => {
                info!(%url, "Using remote ratings");
                Arc::new(RemoteRatings::new(url).context("Invalid RATINGS_URL")?)
            }
            None => Arc::new(
                RatingsService::from_config(
                    &config.ratings,
                    Arc::new(InMemoryRatingsStore::new()),
                    shutdown,
                    &background,
                )
                .await
                .context("Failed to set up ratings")?,
            ),
        };

        let reviews: Arc<dyn Reviews> = match &remote.reviews_url {
            Some(url) => {
                info!(%url, "Using remote reviews");
                Arc::new(RemoteReviews::new(url).context("Invalid REVIEWS_URL")?)
            }
            None => Arc::new(ReviewsService::new(ratings.clone(), config.reviews.clone())),
        };

        let details: Arc<dyn Details> = match &remote.details_url {
            Some(url) => {
                info!(%url, "Using remote details");
                Arc::new(RemoteDetails::new(url).context("Invalid DETAILS_URL")?)
            }
            None => details::from_config(&config.details)?,
        };

        Ok(Self {
            details,
            reviews,
            ratings,
            catalog: Arc::new(Catalog::bookinfo()),
            background,
        })
    }

    /// Waits for the background tasks, which exit once the shutdown token is cancelled.
    pub async fn stopped(&self) {
        self.background.close();
        self.background.wait().await;
    }
}

/// Routes served for `role`, with the components and request tracing layered in.
pub fn router(role: Role, components: &Components) -> Router {
    let routes = match role {
        Role::All | Role::ProductPage => productpage::product_page_service(),
        Role::Details => details::details_service(),
        Role::Reviews => reviews::reviews_service(),
        Role::Ratings => ratings::ratings_service(),
    };

    routes
        .layer(Extension(components.details.clone()))
        .layer(Extension(components.reviews.clone()))
        .layer(Extension(components.ratings.clone()))
        .layer(Extension(components.catalog.clone()))
        // Continues the caller's trace, if the request carries one
        .layer(TraceLayer::new_for_http().make_span_with(tracing_config::OtelMakeSpan))
}

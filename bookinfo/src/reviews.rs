//! Reviews aggregator: canned reviews enriched with stars from the ratings provider.
//!
//! A failing ratings provider never fails a reviews request. Every review then
//! carries the sentinel rating instead.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};
use client::types::{Rating, RatingResponse, Review, ReviewsResponse, REVIEWER_1, REVIEWER_2};
use serde_json::json;
use tracing::{instrument, warn};

use crate::config::ReviewsConfig;
use crate::error::ServiceError;
use crate::ratings::Ratings;

/// Stars value marking a rating that could not be fetched.
pub const UNKNOWN_STARS: i32 = -1;
/// Color text shown in place of stars for [`UNKNOWN_STARS`].
pub const UNAVAILABLE_COLOR: &str = "Ratings service is unavailable";

const REVIEWS: [(&str, &str); 10] = [
    (
        "Reviewer1",
        "An extremely entertaining play by Shakespeare. The slapstick humour is refreshing!",
    ),
    (
        "Reviewer2",
        "Absolutely fun and entertaining. The play lacks thematic depth when compared to other plays by Shakespeare.",
    ),
    (
        "Reviewer3",
        "A thought-provoking play with complex characters and captivating dialogues.",
    ),
    (
        "Reviewer4",
        "Engaging storyline but falls short on character development.",
    ),
    (
        "Reviewer5",
        "An interesting mix of humor and tragedy, with moments of brilliance.",
    ),
    (
        "Reviewer6",
        "The plot is intriguing, though some parts feel rushed.",
    ),
    (
        "Reviewer7",
        "A fine piece of literature with deep thematic elements.",
    ),
    (
        "Reviewer8",
        "One of the less popular works, but it deserves more recognition.",
    ),
    (
        "Reviewer9",
        "The humor is well-placed, though it may not be for everyone.",
    ),
    (
        "Reviewer10",
        "A beautifully written play that captures the essence of human emotions.",
    ),
];

#[async_trait]
pub trait Reviews: Send + Sync {
    async fn book_reviews_by_id(&self, product_id: &str) -> Result<ReviewsResponse, ServiceError>;
}

pub fn unavailable_rating() -> Rating {
    Rating {
        stars: UNKNOWN_STARS,
        color: UNAVAILABLE_COLOR.to_string(),
    }
}

pub struct ReviewsService {
    ratings: Arc<dyn Ratings>,
    config: ReviewsConfig,
}

impl ReviewsService {
    pub fn new(ratings: Arc<dyn Ratings>, config: ReviewsConfig) -> Self {
        Self { ratings, config }
    }

    /// Stars of the two reviewer slots, [`UNKNOWN_STARS`] where the lookup failed.
    async fn reviewer_stars(&self, product_id: &str) -> (i32, i32) {
        let id = match product_id.parse::<i64>() {
            Ok(id) => id,
            Err(e) => {
                warn!(product_id, error = %e, "Invalid product id, serving reviews without ratings");
                return (UNKNOWN_STARS, UNKNOWN_STARS);
            }
        };

        match self.ratings.get_ratings(id).await {
            Ok(response) => (
                slot_stars(&response, REVIEWER_1),
                slot_stars(&response, REVIEWER_2),
            ),
            Err(e) => {
                warn!(product_id, error = %e, "Error getting ratings, serving degraded reviews");
                (UNKNOWN_STARS, UNKNOWN_STARS)
            }
        }
    }

    fn rating(&self, stars: i32) -> Rating {
        if stars == UNKNOWN_STARS {
            unavailable_rating()
        } else {
            Rating {
                stars,
                color: self.config.star_color.clone(),
            }
        }
    }
}

fn slot_stars(response: &RatingResponse, reviewer: &str) -> i32 {
    response
        .ratings
        .get(reviewer)
        .copied()
        .unwrap_or(UNKNOWN_STARS)
}

#[async_trait]
impl Reviews for ReviewsService {
    #[instrument(skip(self))]
    async fn book_reviews_by_id(&self, product_id: &str) -> Result<ReviewsResponse, ServiceError> {
        let stars = if self.config.ratings_enabled {
            Some(self.reviewer_stars(product_id).await)
        } else {
            None
        };

        let reviews = REVIEWS
            .iter()
            .enumerate()
            .map(|(index, (reviewer, text))| Review {
                reviewer: reviewer.to_string(),
                text: text.to_string(),
                rating: match stars {
                    None => Rating::default(),
                    Some((first, _)) if index % 2 == 0 => self.rating(first),
                    Some((_, second)) => self.rating(second),
                },
            })
            .collect();

        Ok(ReviewsResponse {
            id: product_id.to_string(),
            pod_name: self.config.pod_name.clone(),
            cluster_name: self.config.cluster_name.clone(),
            reviews,
        })
    }
}

#[instrument(skip(reviews))]
async fn get_reviews(
    Extension(reviews): Extension<Arc<dyn Reviews>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewsResponse>, ServiceError> {
    Ok(Json(reviews.book_reviews_by_id(&id).await?))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "Reviews is healthy" }))
}

/// Endpoints of a standalone reviews component.
pub fn reviews_service() -> Router {
    Router::new()
        .route("/reviews/:id", get(get_reviews))
        .route("/health", get(health))
}

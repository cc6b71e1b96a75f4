//! Product page: the public HTML page and JSON API composed from the other components.

pub mod catalog;
pub mod views;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use client::types::{BookDetails, Product, RatingResponse, ReviewsResponse};
use tracing::{error, instrument};

use crate::details::{forwarded_headers, Details};
use crate::error::ServiceError;
use crate::parse_product_id;
use crate::ratings::Ratings;
use crate::reviews::Reviews;
use catalog::Catalog;
use views::ProductPageView;

const PRODUCTS_PREFIX: &str = "/api/v1/products/";

/// Product whose details and reviews `/productpage` shows.
const DEFAULT_PRODUCT_ID: i64 = 1;

/// Plain-text error answer of the public routes.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Bad input keeps its 400 and message; anything else becomes a 500 with `context`.
    fn downstream(context: &str, err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            other => Self::internal(format!("{context}: {other}")),
        }
    }
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn index() -> Html<String> {
    Html(views::render_index(&views::topology()))
}

async fn health() -> &'static str {
    "Product page is healthy"
}

#[instrument(skip_all)]
async fn product_page(
    Extension(catalog): Extension<Arc<Catalog>>,
    Extension(details): Extension<Arc<dyn Details>>,
    Extension(reviews): Extension<Arc<dyn Reviews>>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let product = catalog
        .featured()
        .cloned()
        .ok_or_else(|| PageError::internal("No products in catalog"))?;
    let forwarded = forwarded_headers(&headers);
    let product_id = DEFAULT_PRODUCT_ID.to_string();

    let (book_details, book_reviews) = tokio::join!(
        details.get_book_details(DEFAULT_PRODUCT_ID, &forwarded),
        reviews.book_reviews_by_id(&product_id),
    );

    let book_details = book_details.map_err(|e| {
        error!(error = %e, "Failed to get book details");
        PageError::internal(format!("Failed to get book details: {e}"))
    })?;
    let book_reviews = book_reviews.map_err(|e| {
        error!(error = %e, "Failed to get book reviews");
        PageError::internal(format!("Failed to get book reviews: {e}"))
    })?;

    let view = ProductPageView::new(product, book_details, &book_reviews.reviews);
    Ok(Html(views::render_product_page(&view)))
}

async fn list_products(Extension(catalog): Extension<Arc<Catalog>>) -> Json<Vec<Product>> {
    Json(catalog.products().to_vec())
}

#[instrument(skip(details, headers))]
async fn get_product(
    Extension(details): Extension<Arc<dyn Details>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookDetails>, PageError> {
    let id = parse_product_id(&id)?;
    match details.get_book_details(id, &forwarded_headers(&headers)).await {
        Ok(book) => Ok(Json(book)),
        Err(e) => {
            error!(product_id = id, error = %e, "Failed to fetch product details");
            Err(PageError::internal("Failed to fetch product details"))
        }
    }
}

#[instrument(skip(reviews))]
async fn get_product_reviews(
    Extension(reviews): Extension<Arc<dyn Reviews>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewsResponse>, PageError> {
    parse_product_id(&id)?;
    reviews
        .book_reviews_by_id(&id)
        .await
        .map(Json)
        .map_err(|e| PageError::internal(format!("Failed to get book reviews: {e}")))
}

#[instrument(skip(ratings))]
async fn get_product_ratings(
    Extension(ratings): Extension<Arc<dyn Ratings>>,
    Path(id): Path<String>,
) -> Result<Json<RatingResponse>, PageError> {
    let id = parse_product_id(&id)?;
    ratings
        .get_ratings(id)
        .await
        .map(Json)
        .map_err(|e| PageError::internal(format!("Failed to get product ratings: {e}")))
}

#[instrument(skip(ratings, body))]
async fn post_product_ratings(
    Extension(ratings): Extension<Arc<dyn Ratings>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<RatingResponse>, PageError> {
    ratings
        .post_ratings(&id, &body)
        .await
        .map(Json)
        .map_err(|e| PageError::downstream("Failed to post product ratings", e))
}

async fn not_found(uri: Uri) -> PageError {
    if uri.path().starts_with(PRODUCTS_PREFIX) {
        PageError {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid product URL".to_string(),
        }
    } else {
        PageError {
            status: StatusCode::NOT_FOUND,
            message: "404 page not found".to_string(),
        }
    }
}

/// Public routes of the product page.
pub fn product_page_service() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/productpage", get(product_page))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/products/:id/reviews", get(get_product_reviews))
        .route(
            "/api/v1/products/:id/ratings",
            get(get_product_ratings).post(post_product_ratings),
        )
        .fallback(not_found)
}

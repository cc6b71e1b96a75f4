use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Extension, Json, Router};
use client::types::{BookDetails, RatingResponse, ReviewsResponse};
use integration_tests::{serve, start_bookinfo, wait_for_status, TestServer};
use serde_json::{json, Value};

/// Details, reviews and ratings each in their own server, composed by a product page server.
struct SplitDeployment {
    product_page: TestServer,
    ratings: TestServer,
    _reviews: TestServer,
    _details: TestServer,
}

async fn split_deployment(ratings_vars: &[(&str, &str)]) -> SplitDeployment {
    let mut vars = vec![("BOOKINFO_ROLE", "ratings")];
    vars.extend_from_slice(ratings_vars);
    let ratings = start_bookinfo(&vars).await;

    let reviews = start_bookinfo(&[
        ("BOOKINFO_ROLE", "reviews"),
        ("RATINGS_URL", ratings.url.as_str()),
        ("STAR_COLOR", "red"),
    ])
    .await;
    let details = start_bookinfo(&[("BOOKINFO_ROLE", "details")]).await;
    let product_page = start_bookinfo(&[
        ("BOOKINFO_ROLE", "productpage"),
        ("DETAILS_URL", details.url.as_str()),
        ("REVIEWS_URL", reviews.url.as_str()),
        ("RATINGS_URL", ratings.url.as_str()),
    ])
    .await;

    SplitDeployment {
        product_page,
        ratings,
        _reviews: reviews,
        _details: details,
    }
}

#[tokio::test]
async fn product_page_composes_remote_components() {
    let deployment = split_deployment(&[]).await;
    let http = reqwest::Client::new();

    let response = http
        .get(deployment.product_page.url("/productpage"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("The Comedy of Errors"));
    assert!(body.contains("William Shakespeare, 1595"));
    assert_eq!(body.matches(r#"<font color="red">"#).count(), 10);

    let details: BookDetails = http
        .get(deployment.product_page.url("/api/v1/products/4"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details.id, 4);
    assert_eq!(details.isbn_10, "1234567890");
}

#[tokio::test]
async fn posted_ratings_flow_through_remote_reviews() {
    let deployment = split_deployment(&[]).await;
    let http = reqwest::Client::new();

    let posted: RatingResponse = http
        .post(deployment.product_page.url("/api/v1/products/2/ratings"))
        .json(&json!({ "Reviewer1": 2, "Reviewer2": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posted.id, 2);

    let direct: RatingResponse = http
        .get(deployment.ratings.url("/ratings/2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(direct, posted);

    let reviews: ReviewsResponse = http
        .get(deployment.product_page.url("/api/v1/products/2/reviews"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.pod_name, "integration");
    assert_eq!(reviews.reviews[0].rating.stars, 2);
    assert_eq!(reviews.reviews[1].rating.stars, 1);
    assert_eq!(reviews.reviews[0].rating.color, "red");
}

#[tokio::test]
async fn input_errors_survive_the_process_boundary() {
    let deployment = split_deployment(&[]).await;
    let http = reqwest::Client::new();

    let response = http
        .post(deployment.product_page.url("/api/v1/products/2/ratings"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "please provide valid ratings JSON"
    );

    let response = http
        .get(deployment.product_page.url("/api/v1/products/two"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Invalid product ID");
}

#[tokio::test]
async fn unavailable_ratings_degrade_remote_reviews() {
    let deployment = split_deployment(&[("SERVICE_VERSION", "v-unavailable")]).await;
    let http = reqwest::Client::new();
    wait_for_status(
        &http,
        &deployment.ratings.url("/ratings/1"),
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await;

    let body = http
        .get(deployment.product_page.url("/productpage"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body.matches("Ratings service is unavailable").count(), 10);

    let response = http
        .get(deployment.product_page.url("/api/v1/products/1/ratings"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text().await.unwrap(),
        "Failed to get product ratings: service unavailable"
    );
}

#[tokio::test]
async fn database_ratings_reject_posts_remotely() {
    // The pool is lazy, so validation runs without a reachable database
    let deployment = split_deployment(&[
        ("SERVICE_VERSION", "v2"),
        ("DB_TYPE", "mysql"),
        ("MYSQL_DB_HOST", "127.0.0.1"),
        ("MYSQL_DB_PORT", "1"),
    ])
    .await;
    let http = reqwest::Client::new();

    let response = http
        .post(deployment.ratings.url("/ratings/1"))
        .body(r#"{"Reviewer1":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

    let response = http
        .post(deployment.product_page.url("/api/v1/products/1/ratings"))
        .body(r#"{"Reviewer1":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text().await.unwrap(),
        "Failed to post product ratings: Post not implemented for database backed ratings"
    );
}

/// What the stub book API saw on its last request.
#[derive(Debug, Default, Clone)]
struct SeenRequest {
    query: HashMap<String, String>,
    end_user: Option<String>,
    authorization: Option<String>,
}

type Seen = Arc<Mutex<Option<SeenRequest>>>;

async fn volumes(
    Extension(seen): Extension<Seen>,
    Extension(answer): Extension<(StatusCode, Value)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    *seen.lock().unwrap() = Some(SeenRequest {
        query,
        end_user: header("end-user"),
        authorization: header("authorization"),
    });
    (answer.0, Json(answer.1))
}

async fn book_api(status: StatusCode, payload: Value) -> (TestServer, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/books/v1/volumes", get(volumes))
        .layer(Extension(seen.clone()))
        .layer(Extension((status, payload)));
    (serve(app).await, seen)
}

fn comedy_of_errors() -> Value {
    json!({
        "items": [{
            "volumeInfo": {
                "title": "The Comedy of Errors",
                "authors": ["William Shakespeare"],
                "publisher": "Courier Corporation",
                "publishedDate": "2002",
                "industryIdentifiers": [
                    { "type": "ISBN_13", "identifier": "9780486424613" },
                    { "type": "ISBN_10", "identifier": "0486424618" }
                ],
                "pageCount": 80,
                "printType": "BOOK",
                "language": "en"
            }
        }]
    })
}

async fn external_details(book_api: &TestServer) -> TestServer {
    start_bookinfo(&[
        ("BOOKINFO_ROLE", "details"),
        ("ENABLE_EXTERNAL_BOOK_SERVICE", "true"),
        ("EXTERNAL_BOOK_SERVICE_URL", book_api.url.as_str()),
    ])
    .await
}

#[tokio::test]
async fn external_details_query_the_book_api() {
    let (api, seen) = book_api(StatusCode::OK, comedy_of_errors()).await;
    let details_server = external_details(&api).await;
    let product_page = start_bookinfo(&[
        ("BOOKINFO_ROLE", "productpage"),
        ("DETAILS_URL", details_server.url.as_str()),
    ])
    .await;

    let details: BookDetails = reqwest::Client::new()
        .get(product_page.url("/api/v1/products/3"))
        .header("end-user", "jason")
        .header("authorization", "Bearer secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(details.id, 3);
    assert_eq!(details.year, 2002);
    assert_eq!(details.kind, "paperback");
    assert_eq!(details.language, "English");
    assert_eq!(details.isbn_10, "0486424618");
    assert_eq!(details.isbn_13, "9780486424613");

    let seen = seen.lock().unwrap().clone().expect("book api was called");
    assert_eq!(seen.query["q"], "isbn:0486424618");
    assert_eq!(seen.end_user.as_deref(), Some("jason"));
    assert_eq!(seen.authorization, None);
}

#[tokio::test]
async fn book_api_failures_fail_details() {
    for (status, payload) in [
        (StatusCode::OK, json!({ "kind": "books#volumes", "totalItems": 0 })),
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "backend" })),
    ] {
        let (api, _) = book_api(status, payload).await;
        let details_server = external_details(&api).await;
        let product_page = start_bookinfo(&[
            ("BOOKINFO_ROLE", "productpage"),
            ("DETAILS_URL", details_server.url.as_str()),
        ])
        .await;
        let http = reqwest::Client::new();

        let response = http
            .get(details_server.url("/details/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = http
            .get(product_page.url("/api/v1/products/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.text().await.unwrap(),
            "Failed to fetch product details"
        );

        let body = http
            .get(product_page.url("/productpage"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.starts_with("Failed to get book details: "));
    }
}

#[tokio::test]
async fn unreachable_component_fails_the_product_page() {
    // Bind then drop a server so its port refuses connections
    let gone = start_bookinfo(&[("BOOKINFO_ROLE", "reviews")]).await;
    let reviews_url = gone.url.clone();
    drop(gone);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let product_page = start_bookinfo(&[
        ("BOOKINFO_ROLE", "productpage"),
        ("REVIEWS_URL", reviews_url.as_str()),
    ])
    .await;

    let response = reqwest::Client::new()
        .get(product_page.url("/productpage"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .text()
        .await
        .unwrap()
        .starts_with("Failed to get book reviews: "));
}

//! Database backends for the `v2` ratings mode.
//!
//! Both backends only ever read the first two rating rows; they map positionally
//! onto the two reviewer slots and are not keyed by product.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::ServiceError;

const MONGO_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait RatingsBackend: Send + Sync {
    /// Ratings for the first and second reviewer slot.
    async fn first_two_ratings(&self) -> Result<(i32, i32), ServiceError>;
}

pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn RatingsBackend>> {
    match config {
        DatabaseConfig::MySql { host, port, .. } => {
            info!(%host, port, "Using MySQL ratings database");
            let url = config
                .mysql_url()
                .context("MySQL configuration without a connection string")?;
            Ok(Box::new(MySqlRatingsBackend::connect_lazy(&url)?))
        }
        DatabaseConfig::Mongo { url } => {
            info!("Using MongoDB ratings database");
            Ok(Box::new(MongoRatingsBackend::connect(url).await?))
        }
    }
}

pub struct MySqlRatingsBackend {
    pool: MySqlPool,
}

impl MySqlRatingsBackend {
    /// Connections are opened on first use; an unreachable server surfaces per request.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(url)
            .context("Invalid MySQL connection string")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RatingsBackend for MySqlRatingsBackend {
    #[tracing::instrument(name = "get_ratings_from_mysql", skip(self), level = tracing::Level::DEBUG)]
    async fn first_two_ratings(&self) -> Result<(i32, i32), ServiceError> {
        let ratings: Vec<i32> = sqlx::query_scalar::<_, i32>("SELECT Rating FROM ratings LIMIT 2")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error_details = %e, "Ratings select failed");
                match e {
                    sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                        ServiceError::Unavailable(
                            "could not connect to ratings database".to_string(),
                        )
                    }
                    _ => ServiceError::Unavailable("could not perform select".to_string()),
                }
            })?;

        debug!(rows = ratings.len(), "Fetched ratings rows");
        first_two(&ratings)
    }
}

pub struct MongoRatingsBackend {
    client: mongodb::Client,
}

impl MongoRatingsBackend {
    pub async fn connect(url: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(url)
            .await
            .context("Invalid MongoDB connection string")?;
        options.connect_timeout = Some(MONGO_TIMEOUT);
        options.server_selection_timeout = Some(MONGO_TIMEOUT);
        let client =
            mongodb::Client::with_options(options).context("Could not create MongoDB client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RatingsBackend for MongoRatingsBackend {
    #[tracing::instrument(name = "get_ratings_from_mongo", skip(self), level = tracing::Level::DEBUG)]
    async fn first_two_ratings(&self) -> Result<(i32, i32), ServiceError> {
        let collection = self
            .client
            .database("test")
            .collection::<Document>("ratings");

        let cursor = collection.find(doc! {}).await.map_err(|e| {
            tracing::error!(error_details = %e, "Ratings find failed");
            ServiceError::Unavailable("could not connect to ratings database".to_string())
        })?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!(error_details = %e, "Ratings cursor failed");
            ServiceError::Unavailable("could not parse ratings data".to_string())
        })?;

        Ok(ratings_from_documents(&documents))
    }
}

fn first_two(ratings: &[i32]) -> Result<(i32, i32), ServiceError> {
    match ratings {
        [] => Err(ServiceError::Unavailable("ratings not found".to_string())),
        [first] => Ok((*first, 0)),
        [first, second, ..] => Ok((*first, *second)),
    }
}

/// Missing documents or a missing/non-integer `rating` field count as zero stars.
fn ratings_from_documents(documents: &[Document]) -> (i32, i32) {
    let rating = |index: usize| {
        documents
            .get(index)
            .and_then(|d| d.get_i32("rating").ok())
            .unwrap_or(0)
    };
    (rating(0), rating(1))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rows_map_positionally() {
        assert_eq!(first_two(&[4, 2, 1]), Ok((4, 2)));
        assert_eq!(first_two(&[3]), Ok((3, 0)));
        assert_eq!(
            first_two(&[]),
            Err(ServiceError::Unavailable("ratings not found".to_string()))
        );
    }

    #[test]
    fn documents_without_integer_ratings_count_as_zero() {
        let documents = vec![doc! { "rating": 5 }, doc! { "rating": "four" }];
        assert_eq!(ratings_from_documents(&documents), (5, 0));

        assert_eq!(ratings_from_documents(&[doc! { "rating": 2 }]), (2, 0));
        assert_eq!(ratings_from_documents(&[]), (0, 0));
    }
}

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Ratings written through `post_ratings`, keyed by product id.
#[async_trait]
pub trait RatingsStore: Send + Sync {
    async fn get(&self, product_id: i64) -> Option<BTreeMap<String, i32>>;

    /// Replaces the ratings of a product. Last write wins.
    async fn put(&self, product_id: i64, ratings: BTreeMap<String, i32>);
}

/// Process-lifetime store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRatingsStore {
    ratings: RwLock<HashMap<i64, BTreeMap<String, i32>>>,
}

impl InMemoryRatingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RatingsStore for InMemoryRatingsStore {
    async fn get(&self, product_id: i64) -> Option<BTreeMap<String, i32>> {
        self.ratings.read().await.get(&product_id).cloned()
    }

    async fn put(&self, product_id: i64, ratings: BTreeMap<String, i32>) {
        self.ratings.write().await.insert(product_id, ratings);
    }
}

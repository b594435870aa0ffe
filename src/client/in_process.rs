//! Statistics client that calls a hit store directly.

use std::sync::Arc;

use async_trait::async_trait;

use super::StatsClient;
use crate::domain::{NewHit, StatsQuery, ViewStats};
use crate::error::ServiceError;
use crate::persistence::HitStore;

/// Routes statistics calls to a [`HitStore`] in the same process.
#[derive(Debug, Clone)]
pub struct InProcessStatsClient {
    hits: Arc<dyn HitStore>,
}

impl InProcessStatsClient {
    /// Wraps `hits`.
    #[must_use]
    pub fn new(hits: Arc<dyn HitStore>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl StatsClient for InProcessStatsClient {
    async fn hit(&self, hit: &NewHit) -> Result<(), ServiceError> {
        self.hits.insert_hit(hit).await.map(|_| ())
    }

    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
        self.hits.stats(query).await
    }
}

//! Statistics service: hit ingestion and aggregation.

use std::sync::Arc;

use crate::domain::{EndpointHit, NewHit, StatsQuery, ViewStats};
use crate::error::ServiceError;
use crate::persistence::HitStore;

/// Operations of the statistics service.
#[derive(Debug, Clone)]
pub struct StatsService {
    hits: Arc<dyn HitStore>,
}

impl StatsService {
    /// Creates a new `StatsService`.
    #[must_use]
    pub fn new(hits: Arc<dyn HitStore>) -> Self {
        Self { hits }
    }

    /// Appends a hit.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn record(&self, hit: &NewHit) -> Result<EndpointHit, ServiceError> {
        let stored = self.hits.insert_hit(hit).await?;
        tracing::debug!(app = %stored.app, uri = %stored.uri, ip = %stored.ip, "hit recorded");
        Ok(stored)
    }

    /// Aggregates hits, most viewed first.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
        self.hits.stats(query).await
    }
}

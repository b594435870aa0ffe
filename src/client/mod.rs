//! Outbound access to the statistics service.
//!
//! The main service talks to statistics through [`StatsClient`]. Production
//! wiring uses [`HttpStatsClient`]; tests and single-process setups use
//! [`InProcessStatsClient`] over a [`crate::persistence::HitStore`].

pub mod http;
pub mod in_process;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{NewHit, StatsQuery, ViewStats};
use crate::error::ServiceError;

pub use http::HttpStatsClient;
pub use in_process::InProcessStatsClient;

/// Client of the statistics service.
#[async_trait]
pub trait StatsClient: Send + Sync + Debug {
    /// Records one hit.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts and non-2xx answers.
    async fn hit(&self, hit: &NewHit) -> Result<(), ServiceError>;

    /// Fetches aggregated stats.
    ///
    /// # Errors
    ///
    /// Transport failures, timeouts, non-2xx answers and malformed bodies.
    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError>;
}

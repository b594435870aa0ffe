//! Hit reporting and view counts backed by the statistics service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Months, NaiveDateTime};

use crate::client::StatsClient;
use crate::domain::event::event_uri;
use crate::domain::{Clock, Event, NewHit, StatsQuery};

/// How far back views are counted.
const VIEWS_WINDOW_MONTHS: u32 = 50 * 12;

/// Reports public reads and attaches view counts to events.
///
/// Statistics are advisory: every failure is logged and degrades to "no
/// hit recorded" or zero views.
#[derive(Debug, Clone)]
pub struct ViewTracker {
    client: Arc<dyn StatsClient>,
    clock: Arc<dyn Clock>,
    app: String,
}

impl ViewTracker {
    /// Creates a tracker reporting hits as `app`.
    #[must_use]
    pub fn new(client: Arc<dyn StatsClient>, clock: Arc<dyn Clock>, app: &str) -> Self {
        Self {
            client,
            clock,
            app: app.to_string(),
        }
    }

    /// Reports one read of `uri` by `ip`.
    pub async fn record_hit(&self, uri: &str, ip: &str) {
        let hit = NewHit {
            app: self.app.clone(),
            uri: uri.to_string(),
            ip: ip.to_string(),
            timestamp: self.clock.now(),
        };
        if let Err(e) = self.client.hit(&hit).await {
            tracing::warn!(uri, ip, error = %e, "hit not recorded");
        }
    }

    /// Unique-IP view counts of the given events; absent ids have no views.
    pub async fn views(&self, event_ids: &[i64]) -> HashMap<i64, i64> {
        if event_ids.is_empty() {
            return HashMap::new();
        }
        let now = self.clock.now();
        let start = now
            .checked_sub_months(Months::new(VIEWS_WINDOW_MONTHS))
            .unwrap_or(NaiveDateTime::MIN);
        let uris = event_ids.iter().map(|&id| event_uri(id)).collect();
        let stats = match StatsQuery::new(start, now, uris, true) {
            Ok(query) => self.client.stats(&query).await,
            Err(e) => Err(e),
        };
        match stats {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| {
                    let id = row.uri.strip_prefix("/events/")?.parse::<i64>().ok()?;
                    Some((id, row.hits))
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "view counts unavailable");
                HashMap::new()
            }
        }
    }

    /// Sets `views` on every event from a single stats query.
    pub async fn attach(&self, events: &mut [Event]) {
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let views = self.views(&ids).await;
        for event in events {
            event.views = views.get(&event.id).copied().unwrap_or(0);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::client::InProcessStatsClient;
    use crate::domain::event::tests::{at, sample_event};
    use crate::domain::{FixedClock, ViewStats};
    use crate::error::ServiceError;
    use crate::persistence::MemoryHitStore;

    #[derive(Debug)]
    struct DownStats;

    #[async_trait]
    impl StatsClient for DownStats {
        async fn hit(&self, _hit: &NewHit) -> Result<(), ServiceError> {
            Err(ServiceError::Internal("connection refused".into()))
        }

        async fn stats(&self, _query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
            Err(ServiceError::Internal("connection refused".into()))
        }
    }

    fn tracker(client: Arc<dyn StatsClient>) -> ViewTracker {
        ViewTracker::new(
            client,
            Arc::new(FixedClock::new(at("2024-06-01 10:00:00"))),
            "ewm-main-service",
        )
    }

    #[tokio::test]
    async fn views_count_distinct_addresses() {
        let tracker = tracker(Arc::new(InProcessStatsClient::new(Arc::new(
            MemoryHitStore::new(),
        ))));
        let mut events = vec![sample_event()];
        tracker.record_hit("/events/1", "10.0.0.1").await;
        tracker.record_hit("/events/1", "10.0.0.1").await;
        tracker.record_hit("/events/1", "10.0.0.2").await;
        tracker.attach(&mut events).await;
        assert_eq!(events.first().map(|e| e.views), Some(2));
    }

    #[tokio::test]
    async fn unavailable_statistics_mean_zero_views() {
        let tracker = tracker(Arc::new(DownStats));
        let mut events = vec![sample_event()];
        events.iter_mut().for_each(|e| e.views = 42);
        tracker.record_hit("/events/1", "10.0.0.1").await;
        tracker.attach(&mut events).await;
        assert_eq!(events.first().map(|e| e.views), Some(0));
    }
}

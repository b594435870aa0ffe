//! Endpoint hits and aggregated view statistics.

use chrono::NaiveDateTime;

use super::time;
use crate::error::ServiceError;

/// A stored hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointHit {
    /// Store-assigned id.
    pub id: i64,
    /// Name of the reporting service.
    pub app: String,
    /// Requested URI.
    pub uri: String,
    /// Client address.
    pub ip: String,
    /// When the request was served.
    pub timestamp: NaiveDateTime,
}

/// A hit to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHit {
    /// Name of the reporting service.
    pub app: String,
    /// Requested URI.
    pub uri: String,
    /// Client address.
    pub ip: String,
    /// When the request was served.
    pub timestamp: NaiveDateTime,
}

/// Hit count of one (app, uri) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStats {
    /// Reporting service.
    pub app: String,
    /// URI.
    pub uri: String,
    /// Number of hits, or of distinct client addresses when unique.
    pub hits: i64,
}

/// A validated aggregation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    start: NaiveDateTime,
    end: NaiveDateTime,
    uris: Vec<String>,
    unique: bool,
}

impl StatsQuery {
    /// Builds a query over the inclusive window `[start, end]`.
    ///
    /// An empty `uris` list means every URI.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadTime`] if `end < start`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        uris: Vec<String>,
        unique: bool,
    ) -> Result<Self, ServiceError> {
        if end < start {
            return Err(ServiceError::BadTime(format!(
                "end {} must not be before start {}",
                time::format(&end),
                time::format(&start)
            )));
        }
        Ok(Self {
            start,
            end,
            uris,
            unique,
        })
    }

    /// Window start.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Window end.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// URI restriction; empty means none.
    #[must_use]
    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    /// Whether hits are de-duplicated by client address.
    #[must_use]
    pub const fn unique(&self) -> bool {
        self.unique
    }

    /// Whether `hit` falls within the window and URI restriction.
    #[must_use]
    pub fn covers(&self, hit: &EndpointHit) -> bool {
        hit.timestamp >= self.start
            && hit.timestamp <= self.end
            && (self.uris.is_empty() || self.uris.iter().any(|u| *u == hit.uri))
    }
}

/// Orders stats by descending hits, then app and uri for a stable output.
pub fn sort_stats(stats: &mut [ViewStats]) {
    stats.sort_by(|a, b| {
        b.hits
            .cmp(&a.hits)
            .then_with(|| a.app.cmp(&b.app))
            .then_with(|| a.uri.cmp(&b.uri))
    });
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::tests::at;

    #[test]
    fn inverted_window_is_bad_time() {
        let result = StatsQuery::new(at("2024-06-02 00:00:00"), at("2024-06-01 00:00:00"), vec![], false);
        assert!(matches!(result, Err(ServiceError::BadTime(_))));
    }

    #[test]
    fn window_is_inclusive() {
        let Ok(q) = StatsQuery::new(
            at("2024-06-01 00:00:00"),
            at("2024-06-01 12:00:00"),
            vec!["/events/1".to_string()],
            true,
        ) else {
            panic!("valid query");
        };
        let hit = EndpointHit {
            id: 1,
            app: "ewm-main-service".to_string(),
            uri: "/events/1".to_string(),
            ip: "10.0.0.1".to_string(),
            timestamp: at("2024-06-01 12:00:00"),
        };
        assert!(q.covers(&hit));
        let other = EndpointHit {
            uri: "/events/2".to_string(),
            ..hit
        };
        assert!(!q.covers(&other));
    }

    #[test]
    fn stats_sorted_by_hits_desc() {
        let mut stats = vec![
            ViewStats {
                app: "a".into(),
                uri: "/events/1".into(),
                hits: 1,
            },
            ViewStats {
                app: "a".into(),
                uri: "/events/2".into(),
                hits: 4,
            },
        ];
        sort_stats(&mut stats);
        assert_eq!(stats.first().map(|s| s.hits), Some(4));
    }
}

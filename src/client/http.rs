//! HTTP client of the statistics service built on `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use super::StatsClient;
use crate::api::dto::{EndpointHitDto, ViewStatsDto};
use crate::domain::{NewHit, StatsQuery, ViewStats, time};
use crate::error::ServiceError;

/// Talks to `POST /hit` and `GET /stats` of a remote statistics service.
///
/// Every call is bounded by the timeout given at construction.
#[derive(Debug, Clone)]
pub struct HttpStatsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStatsClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if the underlying client cannot
    /// be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("cannot build statistics client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full `GET /stats` URL for `query`.
    ///
    /// Timestamps are percent-encoded, so the space between date and time
    /// is sent as `%20`.
    fn stats_url(&self, query: &StatsQuery) -> String {
        let mut url = format!(
            "{}/stats?start={}&end={}",
            self.base_url,
            urlencoding::encode(&time::format(&query.start())),
            urlencoding::encode(&time::format(&query.end())),
        );
        for uri in query.uris() {
            url.push_str("&uris=");
            url.push_str(&urlencoding::encode(uri));
        }
        url.push_str(if query.unique() {
            "&unique=true"
        } else {
            "&unique=false"
        });
        url
    }
}

fn unavailable(err: reqwest::Error) -> ServiceError {
    ServiceError::Internal(format!("statistics service unavailable: {err}"))
}

#[async_trait]
impl StatsClient for HttpStatsClient {
    async fn hit(&self, hit: &NewHit) -> Result<(), ServiceError> {
        self.http
            .post(format!("{}/hit", self.base_url))
            .json(&EndpointHitDto::from(hit))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable)?;
        Ok(())
    }

    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
        let rows: Vec<ViewStatsDto> = self
            .http
            .get(self.stats_url(query))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;
        Ok(rows.into_iter().map(ViewStats::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::tests::at;

    #[test]
    fn stats_url_encodes_timestamps_and_repeats_uris() {
        let Ok(client) = HttpStatsClient::new("http://stats:9090/", Duration::from_millis(100)) else {
            panic!("client");
        };
        let Ok(query) = StatsQuery::new(
            at("2024-06-01 10:00:00"),
            at("2024-06-02 10:00:00"),
            vec!["/events/1".to_string(), "/events/2".to_string()],
            true,
        ) else {
            panic!("query");
        };
        assert_eq!(
            client.stats_url(&query),
            "http://stats:9090/stats?start=2024-06-01%2010%3A00%3A00\
             &end=2024-06-02%2010%3A00%3A00&uris=%2Fevents%2F1&uris=%2Fevents%2F2&unique=true"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let Ok(client) = HttpStatsClient::new("http://127.0.0.1:1", Duration::from_millis(200)) else {
            panic!("client");
        };
        let result = client
            .hit(&NewHit {
                app: "ewm-main-service".into(),
                uri: "/events".into(),
                ip: "127.0.0.1".into(),
                timestamp: at("2024-06-01 10:00:00"),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }
}

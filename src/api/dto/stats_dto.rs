//! Wire format of the statistics service, shared with the outbound client.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::not_blank;
use crate::domain::{EndpointHit, NewHit, ViewStats, time};

/// Body of `POST /hit` and its 201 response.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EndpointHitDto {
    /// Assigned by the statistics service; ignored on input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Reporting service.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    #[schema(example = "ewm-main-service")]
    pub app: String,
    /// Requested URI.
    #[validate(length(min = 1, max = 512), custom(function = "not_blank"))]
    #[schema(example = "/events/1")]
    pub uri: String,
    /// Client address.
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    #[schema(example = "192.163.0.1")]
    pub ip: String,
    /// Moment of the hit.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-06-01 10:00:00")]
    pub timestamp: NaiveDateTime,
}

impl From<&NewHit> for EndpointHitDto {
    fn from(hit: &NewHit) -> Self {
        Self {
            id: None,
            app: hit.app.clone(),
            uri: hit.uri.clone(),
            ip: hit.ip.clone(),
            timestamp: hit.timestamp,
        }
    }
}

impl From<EndpointHit> for EndpointHitDto {
    fn from(hit: EndpointHit) -> Self {
        Self {
            id: Some(hit.id),
            app: hit.app,
            uri: hit.uri,
            ip: hit.ip,
            timestamp: hit.timestamp,
        }
    }
}

impl From<EndpointHitDto> for NewHit {
    fn from(dto: EndpointHitDto) -> Self {
        Self {
            app: dto.app,
            uri: dto.uri,
            ip: dto.ip,
            timestamp: dto.timestamp,
        }
    }
}

/// One row of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ViewStatsDto {
    /// Reporting service.
    pub app: String,
    /// URI.
    pub uri: String,
    /// Number of (unique) hits.
    pub hits: i64,
}

impl From<ViewStats> for ViewStatsDto {
    fn from(stats: ViewStats) -> Self {
        Self {
            app: stats.app,
            uri: stats.uri,
            hits: stats.hits,
        }
    }
}

impl From<ViewStatsDto> for ViewStats {
    fn from(dto: ViewStatsDto) -> Self {
        Self {
            app: dto.app,
            uri: dto.uri,
            hits: dto.hits,
        }
    }
}

/// Query of `GET /stats`, documented for OpenAPI only; parsing is done by
/// [`crate::api::query::QueryParams`] to accept repeated and comma-separated
/// `uris`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsParams {
    /// Window start, `yyyy-MM-dd HH:mm:ss`.
    pub start: String,
    /// Window end, `yyyy-MM-dd HH:mm:ss`.
    pub end: String,
    /// URIs to restrict to; all when absent.
    pub uris: Option<Vec<String>>,
    /// Count distinct IPs only. Defaults to `false`.
    pub unique: Option<bool>,
}

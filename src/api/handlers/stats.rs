//! Statistics service handlers: hit ingestion and aggregation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{EndpointHitDto, StatsParams, ViewStatsDto};
use crate::api::extract::ValidJson;
use crate::api::query::QueryParams;
use crate::app_state::StatsState;
use crate::domain::{NewHit, StatsQuery};
use crate::error::{ApiError, ServiceError};

/// `POST /hit` — Record one endpoint hit.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid body or a storage failure.
#[utoipa::path(
    post,
    path = "/hit",
    tag = "Statistics",
    summary = "Record a hit",
    request_body = EndpointHitDto,
    responses(
        (status = 201, description = "Hit stored", body = EndpointHitDto),
        (status = 400, description = "Invalid body", body = ApiError),
    )
)]
pub async fn record_hit(
    State(state): State<StatsState>,
    ValidJson(body): ValidJson<EndpointHitDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let hit = state.stats.record(&NewHit::from(body)).await?;
    Ok((StatusCode::CREATED, Json(EndpointHitDto::from(hit))))
}

/// `GET /stats` — Hit counts per `(app, uri)` over a window.
///
/// # Errors
///
/// Returns [`ServiceError`] if `start` or `end` is missing or malformed, or
/// `end` precedes `start`.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Statistics",
    summary = "Aggregated hits",
    description = "Counts hits per (app, uri) with `start <= timestamp <= end`, most hit first. With `unique=true` each ip counts once per uri.",
    params(StatsParams),
    responses(
        (status = 200, description = "Aggregated hits", body = Vec<ViewStatsDto>),
        (status = 400, description = "Bad window or parameters", body = ApiError),
    )
)]
pub async fn get_stats(
    State(state): State<StatsState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let query = StatsQuery::new(
        params.required_timestamp("start")?,
        params.required_timestamp("end")?,
        params.values("uris").map(str::to_string).collect(),
        params.bool("unique")?.unwrap_or(false),
    )?;
    let stats = state.stats.stats(&query).await?;
    Ok(Json(
        stats.into_iter().map(ViewStatsDto::from).collect::<Vec<_>>(),
    ))
}

/// Statistics routes.
pub fn routes() -> Router<StatsState> {
    Router::new()
        .route("/hit", post(record_hit))
        .route("/stats", get(get_stats))
}

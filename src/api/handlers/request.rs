//! Participation request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{
    EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult, ParticipationRequestDto,
};
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::error::{ApiError, ServiceError};

/// `GET /users/{user_id}/requests` — Requests filed by the user.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/users/{user_id}/requests",
    tag = "Requests",
    summary = "List own requests",
    params(("user_id" = i64, Path, description = "Requester id")),
    responses(
        (status = 200, description = "Own requests", body = Vec<ParticipationRequestDto>),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn list_own_requests(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let requests = state.requests.list_own(user_id).await?;
    Ok(Json(
        requests
            .into_iter()
            .map(ParticipationRequestDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// `POST /users/{user_id}/requests?eventId=` — Ask to join an event.
///
/// # Errors
///
/// Returns [`ServiceError`] if `eventId` is missing, the user or event does
/// not exist, or a participation rule forbids the request.
#[utoipa::path(
    post,
    path = "/users/{user_id}/requests",
    tag = "Requests",
    summary = "Request participation",
    description = "Confirmed at once when the event needs no moderation or has no limit, PENDING otherwise.",
    params(
        ("user_id" = i64, Path, description = "Requester id"),
        ("eventId" = i64, Query, description = "Event to join"),
    ),
    responses(
        (status = 201, description = "Request filed", body = ParticipationRequestDto),
        (status = 400, description = "Missing eventId", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "Participation forbidden", body = ApiError),
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let event_id = params.parse::<i64>("eventId")?.ok_or_else(|| {
        ServiceError::BadRequest("required parameter 'eventId' is not present".to_string())
    })?;
    let request = state.requests.create(user_id, event_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ParticipationRequestDto::from(request)),
    ))
}

/// `PATCH /users/{user_id}/requests/{request_id}/cancel` — Withdraw a request.
///
/// # Errors
///
/// Returns [`ServiceError`] if the request is missing or not the user's.
#[utoipa::path(
    patch,
    path = "/users/{user_id}/requests/{request_id}/cancel",
    tag = "Requests",
    summary = "Cancel own request",
    params(
        ("user_id" = i64, Path, description = "Requester id"),
        ("request_id" = i64, Path, description = "Request id"),
    ),
    responses(
        (status = 200, description = "Canceled request", body = ParticipationRequestDto),
        (status = 401, description = "Not the requester", body = ApiError),
        (status = 404, description = "User or request not found", body = ApiError),
    )
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    ApiPath((user_id, request_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state.requests.cancel_own(user_id, request_id).await?;
    Ok(Json(ParticipationRequestDto::from(request)))
}

/// `GET /users/{user_id}/events/{event_id}/requests` — Requests for an own event.
///
/// # Errors
///
/// Returns [`ServiceError`] if the event is missing or not the user's.
#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}/requests",
    tag = "Requests",
    summary = "List requests for an own event",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Requests for the event", body = Vec<ParticipationRequestDto>),
        (status = 401, description = "Not the initiator", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
    )
)]
pub async fn list_event_requests(
    State(state): State<AppState>,
    ApiPath((user_id, event_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    let requests = state.requests.list_for_event(user_id, event_id).await?;
    Ok(Json(
        requests
            .into_iter()
            .map(ParticipationRequestDto::from)
            .collect::<Vec<_>>(),
    ))
}

/// `PATCH /users/{user_id}/events/{event_id}/requests` — Confirm or reject.
///
/// # Errors
///
/// Returns [`ServiceError`] when the batch breaks a rule; nothing is
/// changed in that case.
#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}/requests",
    tag = "Requests",
    summary = "Moderate requests of an own event",
    description = "All listed requests must be PENDING. Confirming stops at the participant limit; the rest of the batch is rejected.",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id"),
    ),
    request_body = EventRequestStatusUpdateRequest,
    responses(
        (status = 200, description = "Outcome of the batch", body = EventRequestStatusUpdateResult),
        (status = 401, description = "Not the initiator", body = ApiError),
        (status = 404, description = "User, event or request not found", body = ApiError),
        (status = 409, description = "Limit reached or request not pending", body = ApiError),
    )
)]
pub async fn update_event_requests(
    State(state): State<AppState>,
    ApiPath((user_id, event_id)): ApiPath<(i64, i64)>,
    ValidJson(body): ValidJson<EventRequestStatusUpdateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .requests
        .update_statuses(user_id, event_id, &body.request_ids, body.status)
        .await?;
    Ok(Json(EventRequestStatusUpdateResult::from(outcome)))
}

/// Participation request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/requests",
            get(list_own_requests).post(create_request),
        )
        .route(
            "/users/{user_id}/requests/{request_id}/cancel",
            patch(cancel_request),
        )
        .route(
            "/users/{user_id}/events/{event_id}/requests",
            get(list_event_requests).patch(update_event_requests),
        )
}

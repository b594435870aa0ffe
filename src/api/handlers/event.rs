//! Event handlers: owner, admin and public surfaces.

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{
    EventFullDto, EventShortDto, NewEventDto, UpdateEventAdminRequest, UpdateEventUserRequest,
};
use crate::api::extract::{ApiPath, ClientIp, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::domain::EventState;
use crate::domain::search::{AdminEventFilter, EventSort, PublicEventFilter};
use crate::error::{ApiError, ServiceError};

// ── Owner ──

/// `POST /users/{user_id}/events` — Create a PENDING event.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid body, a date less than two hours
/// away, or a missing user or category.
#[utoipa::path(
    post,
    path = "/users/{user_id}/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates a PENDING event owned by the user. The event date must be at least two hours ahead.",
    params(("user_id" = i64, Path, description = "Initiator id")),
    request_body = NewEventDto,
    responses(
        (status = 201, description = "Event created", body = EventFullDto),
        (status = 400, description = "Invalid body or event date", body = ApiError),
        (status = 404, description = "User or category not found", body = ApiError),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    ValidJson(body): ValidJson<NewEventDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.events.create(user_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(EventFullDto::from(event))))
}

/// `GET /users/{user_id}/events` — Events created by the user.
///
/// # Errors
///
/// Returns [`ServiceError`] on bad paging or a missing user.
#[utoipa::path(
    get,
    path = "/users/{user_id}/events",
    tag = "Events",
    summary = "List own events",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Own events, oldest first", body = Vec<EventShortDto>),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn list_own_events(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let events = state.events.list_owned(user_id, params.page()?).await?;
    Ok(Json(
        events.into_iter().map(EventShortDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /users/{user_id}/events/{event_id}` — Full view of an own event.
///
/// # Errors
///
/// Returns [`ServiceError`] if the user or event is missing or the user
/// did not create the event.
#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}",
    tag = "Events",
    summary = "Fetch an own event",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "The event", body = EventFullDto),
        (status = 401, description = "Not the initiator", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
    )
)]
pub async fn get_own_event(
    State(state): State<AppState>,
    ApiPath((user_id, event_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.events.get_owned(user_id, event_id).await?;
    Ok(Json(EventFullDto::from(event)))
}

/// `PATCH /users/{user_id}/events/{event_id}` — Edit, resubmit or withdraw.
///
/// # Errors
///
/// Returns [`ServiceError`] if the event is published, the user is not the
/// initiator, or a new date is less than two hours away.
#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}",
    tag = "Events",
    summary = "Edit an own event",
    description = "Only PENDING or CANCELED events can be changed. `SEND_TO_REVIEW` moves the event to PENDING, `CANCEL_REVIEW` to CANCELED.",
    params(
        ("user_id" = i64, Path, description = "Initiator id"),
        ("event_id" = i64, Path, description = "Event id"),
    ),
    request_body = UpdateEventUserRequest,
    responses(
        (status = 200, description = "Updated event", body = EventFullDto),
        (status = 400, description = "Invalid body or event date", body = ApiError),
        (status = 401, description = "Not the initiator", body = ApiError),
        (status = 404, description = "User, event or category not found", body = ApiError),
        (status = 409, description = "Event is published", body = ApiError),
    )
)]
pub async fn update_own_event(
    State(state): State<AppState>,
    ApiPath((user_id, event_id)): ApiPath<(i64, i64)>,
    ValidJson(body): ValidJson<UpdateEventUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state
        .events
        .update_by_owner(user_id, event_id, body.into())
        .await?;
    Ok(Json(EventFullDto::from(event)))
}

// ── Admin ──

/// `GET /admin/events` — Search events of any state.
///
/// # Errors
///
/// Returns [`ServiceError`] on malformed parameters or an inverted window.
#[utoipa::path(
    get,
    path = "/admin/events",
    tag = "Events",
    summary = "Admin event search",
    params(
        ("users" = Option<Vec<i64>>, Query, description = "Initiator ids"),
        ("states" = Option<Vec<EventState>>, Query, description = "Accepted states"),
        ("categories" = Option<Vec<i64>>, Query, description = "Category ids"),
        ("rangeStart" = Option<String>, Query, description = "Earliest event date, yyyy-MM-dd HH:mm:ss"),
        ("rangeEnd" = Option<String>, Query, description = "Latest event date, yyyy-MM-dd HH:mm:ss"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Matching events, oldest first", body = Vec<EventFullDto>),
        (status = 400, description = "Bad parameters", body = ApiError),
    )
)]
pub async fn search_events_admin(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = AdminEventFilter {
        users: params.ids("users")?,
        states: params.list("states")?,
        categories: params.ids("categories")?,
        range_start: params.timestamp("rangeStart")?,
        range_end: params.timestamp("rangeEnd")?,
    };
    let events = state.events.list_by_admin(&filter, params.page()?).await?;
    Ok(Json(
        events.into_iter().map(EventFullDto::from).collect::<Vec<_>>(),
    ))
}

/// `PATCH /admin/events/{event_id}` — Edit, publish or reject.
///
/// # Errors
///
/// Returns [`ServiceError`] on a forbidden transition or a date rule
/// violation.
#[utoipa::path(
    patch,
    path = "/admin/events/{event_id}",
    tag = "Events",
    summary = "Admin event edit",
    description = "`PUBLISH_EVENT` requires a PENDING event dated at least one hour after publication. `REJECT_EVENT` is refused for published events.",
    params(("event_id" = i64, Path, description = "Event id")),
    request_body = UpdateEventAdminRequest,
    responses(
        (status = 200, description = "Updated event", body = EventFullDto),
        (status = 400, description = "Invalid body or event date", body = ApiError),
        (status = 404, description = "Event or category not found", body = ApiError),
        (status = 409, description = "Transition not allowed", body = ApiError),
    )
)]
pub async fn update_event_admin(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
    ValidJson(body): ValidJson<UpdateEventAdminRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.events.update_by_admin(event_id, body.into()).await?;
    Ok(Json(EventFullDto::from(event)))
}

// ── Public ──

/// `GET /events` — Search published events.
///
/// # Errors
///
/// Returns [`ServiceError`] on malformed parameters or an inverted window.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    summary = "Public event search",
    description = "Only published events are returned. Each call is reported to the statistics service.",
    params(
        ("text" = Option<String>, Query, description = "Case-insensitive text in annotation or description"),
        ("categories" = Option<Vec<i64>>, Query, description = "Category ids"),
        ("paid" = Option<bool>, Query, description = "Paid flag"),
        ("rangeStart" = Option<String>, Query, description = "Earliest event date, yyyy-MM-dd HH:mm:ss"),
        ("rangeEnd" = Option<String>, Query, description = "Latest event date, yyyy-MM-dd HH:mm:ss"),
        ("onlyAvailable" = Option<bool>, Query, description = "Only events with free slots, default false"),
        ("sort" = Option<EventSort>, Query, description = "EVENT_DATE or VIEWS"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Matching events", body = Vec<EventShortDto>),
        (status = 400, description = "Bad parameters", body = ApiError),
    )
)]
pub async fn search_events_public(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    OriginalUri(uri): OriginalUri,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = PublicEventFilter {
        text: params.string("text").map(str::to_string),
        categories: params.ids("categories")?,
        paid: params.bool("paid")?,
        range_start: params.timestamp("rangeStart")?,
        range_end: params.timestamp("rangeEnd")?,
        only_available: params.bool("onlyAvailable")?.unwrap_or(false),
        sort: params.parse("sort")?,
    };
    let events = state
        .events
        .list_public(&filter, params.page()?, &ip, uri.path())
        .await?;
    Ok(Json(
        events.into_iter().map(EventShortDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /events/{event_id}` — Fetch a published event.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] unless the event exists and is
/// published.
#[utoipa::path(
    get,
    path = "/events/{event_id}",
    tag = "Events",
    summary = "Fetch a published event",
    description = "The read is reported to the statistics service before views are counted.",
    params(("event_id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = EventFullDto),
        (status = 404, description = "Event not found or not published", body = ApiError),
    )
)]
pub async fn get_event_public(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.events.get_public(event_id, &ip).await?;
    Ok(Json(EventFullDto::from(event)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/events",
            get(list_own_events).post(create_event),
        )
        .route(
            "/users/{user_id}/events/{event_id}",
            get(get_own_event).patch(update_own_event),
        )
        .route("/admin/events", get(search_events_admin))
        .route("/admin/events/{event_id}", patch(update_event_admin))
        .route("/events", get(search_events_public))
        .route("/events/{event_id}", get(get_event_public))
}

//! Compilation handlers: admin curation and public reads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{CompilationDto, NewCompilationDto, UpdateCompilationRequest};
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::error::{ApiError, ServiceError};

/// `POST /admin/compilations` — Create a compilation.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid body or unknown event ids.
#[utoipa::path(
    post,
    path = "/admin/compilations",
    tag = "Compilations",
    summary = "Create a compilation",
    request_body = NewCompilationDto,
    responses(
        (status = 201, description = "Compilation created", body = CompilationDto),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 404, description = "Unknown event ids", body = ApiError),
    )
)]
pub async fn create_compilation(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewCompilationDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.compilations.create(&body.into()).await?;
    Ok((StatusCode::CREATED, Json(CompilationDto::from(view))))
}

/// `PATCH /admin/compilations/{comp_id}` — Partially update a compilation.
///
/// # Errors
///
/// Returns [`ServiceError`] if the compilation or a listed event is missing.
#[utoipa::path(
    patch,
    path = "/admin/compilations/{comp_id}",
    tag = "Compilations",
    summary = "Update a compilation",
    description = "Omitted fields are kept. A supplied event list replaces the current one.",
    params(("comp_id" = i64, Path, description = "Compilation id")),
    request_body = UpdateCompilationRequest,
    responses(
        (status = 200, description = "Updated compilation", body = CompilationDto),
        (status = 404, description = "Compilation or events not found", body = ApiError),
    )
)]
pub async fn update_compilation(
    State(state): State<AppState>,
    ApiPath(comp_id): ApiPath<i64>,
    ValidJson(body): ValidJson<UpdateCompilationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.compilations.update(comp_id, &body.into()).await?;
    Ok(Json(CompilationDto::from(view)))
}

/// `DELETE /admin/compilations/{comp_id}` — Delete a compilation.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if it does not exist.
#[utoipa::path(
    delete,
    path = "/admin/compilations/{comp_id}",
    tag = "Compilations",
    summary = "Delete a compilation",
    params(("comp_id" = i64, Path, description = "Compilation id")),
    responses(
        (status = 204, description = "Compilation deleted"),
        (status = 404, description = "Compilation not found", body = ApiError),
    )
)]
pub async fn delete_compilation(
    State(state): State<AppState>,
    ApiPath(comp_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.compilations.delete(comp_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /compilations` — List compilations by id.
///
/// # Errors
///
/// Returns [`ServiceError`] on malformed parameters.
#[utoipa::path(
    get,
    path = "/compilations",
    tag = "Compilations",
    summary = "List compilations",
    params(
        ("pinned" = Option<bool>, Query, description = "Only pinned or unpinned; all when omitted"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Compilations", body = Vec<CompilationDto>),
        (status = 400, description = "Bad parameters", body = ApiError),
    )
)]
pub async fn list_compilations(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let views = state
        .compilations
        .list(params.bool("pinned")?, params.page()?)
        .await?;
    Ok(Json(
        views.into_iter().map(CompilationDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /compilations/{comp_id}` — Fetch a compilation.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/compilations/{comp_id}",
    tag = "Compilations",
    summary = "Fetch a compilation",
    params(("comp_id" = i64, Path, description = "Compilation id")),
    responses(
        (status = 200, description = "The compilation", body = CompilationDto),
        (status = 404, description = "Compilation not found", body = ApiError),
    )
)]
pub async fn get_compilation(
    State(state): State<AppState>,
    ApiPath(comp_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.compilations.get(comp_id).await?;
    Ok(Json(CompilationDto::from(view)))
}

/// Compilation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/compilations", post(create_compilation))
        .route(
            "/admin/compilations/{comp_id}",
            patch(update_compilation).delete(delete_compilation),
        )
        .route("/compilations", get(list_compilations))
        .route("/compilations/{comp_id}", get(get_compilation))
}

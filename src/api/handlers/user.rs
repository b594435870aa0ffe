//! Admin user management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::{NewUserRequest, UserDto};
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::domain::NewUser;
use crate::error::{ApiError, ServiceError};

/// `POST /admin/users` — Register a user.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid body or a taken e-mail.
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "Users",
    summary = "Register a user",
    request_body = NewUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 409, description = "E-mail already taken", body = ApiError),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.users.create(&NewUser::from(body)).await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// `GET /admin/users` — List users, optionally by id.
///
/// # Errors
///
/// Returns [`ServiceError`] on malformed ids or paging.
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Users",
    summary = "List users",
    params(
        ("ids" = Option<Vec<i64>>, Query, description = "Restrict to these ids"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserDto>),
        (status = 400, description = "Bad parameters", body = ApiError),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let ids = params.ids("ids")?;
    let users = state.users.list(&ids, params.page()?).await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect::<Vec<_>>()))
}

/// `DELETE /admin/users/{user_id}` — Delete a user.
///
/// # Errors
///
/// Returns [`ServiceError`] if the user is missing or still referenced.
#[utoipa::path(
    delete,
    path = "/admin/users/{user_id}",
    tag = "Users",
    summary = "Delete a user",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "User still referenced", body = ApiError),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{user_id}", delete(delete_user))
}

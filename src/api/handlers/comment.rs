//! Comment handlers: authors, moderators and public readers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{CommentFullDto, NewCommentDto, UpdateCommentDto, UpdateStatusCommentAdmin};
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::domain::CommentStatus;
use crate::domain::search::CommentFilter;
use crate::error::{ApiError, ServiceError};
use crate::service::CommentView;

fn full(views: Vec<CommentView>) -> Json<Vec<CommentFullDto>> {
    Json(views.into_iter().map(CommentFullDto::from).collect())
}

// ── Author ──

/// `POST /users/{user_id}/comments/{id}` — Comment on published event `id`.
///
/// # Errors
///
/// Returns [`ServiceError`] if the user or event is missing or the event is
/// not published.
#[utoipa::path(
    post,
    path = "/users/{user_id}/comments/{id}",
    tag = "Comments",
    summary = "Post a comment",
    description = "New comments are PENDING until a moderator publishes them.",
    params(
        ("user_id" = i64, Path, description = "Author id"),
        ("id" = i64, Path, description = "Event id"),
    ),
    request_body = NewCommentDto,
    responses(
        (status = 201, description = "Comment posted", body = CommentFullDto),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "Event not published", body = ApiError),
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    ApiPath((user_id, event_id)): ApiPath<(i64, i64)>,
    ValidJson(body): ValidJson<NewCommentDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state
        .comments
        .create(user_id, event_id, body.text.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(CommentFullDto::from(view))))
}

/// `GET /users/{user_id}/comments/{id}` — Fetch own comment `id`.
///
/// # Errors
///
/// Returns [`ServiceError`] if the comment is missing or not the user's.
#[utoipa::path(
    get,
    path = "/users/{user_id}/comments/{id}",
    tag = "Comments",
    summary = "Fetch an own comment",
    params(
        ("user_id" = i64, Path, description = "Author id"),
        ("id" = i64, Path, description = "Comment id"),
    ),
    responses(
        (status = 200, description = "The comment", body = CommentFullDto),
        (status = 401, description = "Not the author", body = ApiError),
        (status = 404, description = "User or comment not found", body = ApiError),
    )
)]
pub async fn get_own_comment(
    State(state): State<AppState>,
    ApiPath((user_id, comment_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.comments.get_own(user_id, comment_id).await?;
    Ok(Json(CommentFullDto::from(view)))
}

/// `PATCH /users/{user_id}/comments/{id}` — Edit own comment `id`.
///
/// # Errors
///
/// Returns [`ServiceError`] if the comment is missing, not the user's, or
/// already published.
#[utoipa::path(
    patch,
    path = "/users/{user_id}/comments/{id}",
    tag = "Comments",
    summary = "Edit an own comment",
    description = "Published comments are frozen. Editing a canceled comment sends it back to moderation.",
    params(
        ("user_id" = i64, Path, description = "Author id"),
        ("id" = i64, Path, description = "Comment id"),
    ),
    request_body = UpdateCommentDto,
    responses(
        (status = 200, description = "Edited comment", body = CommentFullDto),
        (status = 401, description = "Not the author", body = ApiError),
        (status = 404, description = "User or comment not found", body = ApiError),
        (status = 409, description = "Comment already published", body = ApiError),
    )
)]
pub async fn edit_own_comment(
    State(state): State<AppState>,
    ApiPath((user_id, comment_id)): ApiPath<(i64, i64)>,
    ValidJson(body): ValidJson<UpdateCommentDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state
        .comments
        .edit_own(user_id, comment_id, body.text.trim())
        .await?;
    Ok(Json(CommentFullDto::from(view)))
}

/// `GET /users/{user_id}/comments` — Own comments, oldest first.
///
/// # Errors
///
/// Returns [`ServiceError`] on bad paging or a missing user.
#[utoipa::path(
    get,
    path = "/users/{user_id}/comments",
    tag = "Comments",
    summary = "List own comments",
    params(
        ("user_id" = i64, Path, description = "Author id"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Own comments", body = Vec<CommentFullDto>),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn list_own_comments(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let views = state.comments.list_own(user_id, params.page()?).await?;
    Ok(full(views))
}

// ── Public ──

/// `GET /comments/{event_id}` — Published comments of an event.
///
/// # Errors
///
/// Returns [`ServiceError`] on bad paging or a missing event.
#[utoipa::path(
    get,
    path = "/comments/{event_id}",
    tag = "Comments",
    summary = "List published comments of an event",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Published comments, oldest first", body = Vec<CommentFullDto>),
        (status = 404, description = "Event not found", body = ApiError),
    )
)]
pub async fn list_event_comments(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let views = state.comments.list_public(event_id, params.page()?).await?;
    Ok(full(views))
}

// ── Admin ──

/// `PATCH /admin/comments/{comment_id}` — Publish or decline a comment.
///
/// # Errors
///
/// Returns [`ServiceError`] if the comment is missing or not PENDING.
#[utoipa::path(
    patch,
    path = "/admin/comments/{comment_id}",
    tag = "Comments",
    summary = "Moderate a comment",
    params(("comment_id" = i64, Path, description = "Comment id")),
    request_body = UpdateStatusCommentAdmin,
    responses(
        (status = 200, description = "Moderated comment", body = CommentFullDto),
        (status = 404, description = "Comment not found", body = ApiError),
        (status = 409, description = "Comment not pending", body = ApiError),
    )
)]
pub async fn moderate_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i64>,
    ValidJson(body): ValidJson<UpdateStatusCommentAdmin>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.comments.moderate(comment_id, body.status).await?;
    Ok(Json(CommentFullDto::from(view)))
}

/// `DELETE /admin/comments/{comment_id}` — Delete a comment.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if it does not exist.
#[utoipa::path(
    delete,
    path = "/admin/comments/{comment_id}",
    tag = "Comments",
    summary = "Delete a comment",
    params(("comment_id" = i64, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Comment not found", body = ApiError),
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.comments.delete(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /admin/comments` — Search comments in any status.
///
/// # Errors
///
/// Returns [`ServiceError`] on malformed parameters or an inverted window.
#[utoipa::path(
    get,
    path = "/admin/comments",
    tag = "Comments",
    summary = "Admin comment search",
    params(
        ("commentIds" = Option<Vec<i64>>, Query, description = "Comment ids"),
        ("text" = Option<String>, Query, description = "Case-insensitive text"),
        ("commentatorIds" = Option<Vec<i64>>, Query, description = "Author ids"),
        ("eventIds" = Option<Vec<i64>>, Query, description = "Event ids"),
        ("rangeStart" = Option<String>, Query, description = "Earliest creation time, yyyy-MM-dd HH:mm:ss"),
        ("rangeEnd" = Option<String>, Query, description = "Latest creation time, yyyy-MM-dd HH:mm:ss"),
        ("status" = Option<CommentStatus>, Query, description = "Moderation status"),
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Matching comments ordered by id", body = Vec<CommentFullDto>),
        (status = 400, description = "Bad parameters", body = ApiError),
    )
)]
pub async fn search_comments(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = CommentFilter {
        ids: params.ids("commentIds")?,
        text: params.string("text").map(str::to_string),
        commentator_ids: params.ids("commentatorIds")?,
        event_ids: params.ids("eventIds")?,
        range_start: params.timestamp("rangeStart")?,
        range_end: params.timestamp("rangeEnd")?,
        status: params.parse("status")?,
    };
    let views = state.comments.search(&filter, params.page()?).await?;
    Ok(full(views))
}

/// Comment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/comments", get(list_own_comments))
        .route(
            "/users/{user_id}/comments/{id}",
            get(get_own_comment)
                .post(create_comment)
                .patch(edit_own_comment),
        )
        .route("/comments/{event_id}", get(list_event_comments))
        .route("/admin/comments", get(search_comments))
        .route(
            "/admin/comments/{comment_id}",
            patch(moderate_comment).delete(delete_comment),
        )
}

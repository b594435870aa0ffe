//! Category handlers: admin management and public reads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{CategoryDto, NewCategoryDto};
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::query::QueryParams;
use crate::app_state::AppState;
use crate::error::{ApiError, ServiceError};

/// `POST /admin/categories` — Create a category.
///
/// # Errors
///
/// Returns [`ServiceError`] on an invalid body or a taken name.
#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = "Categories",
    summary = "Create a category",
    request_body = NewCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError),
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<NewCategoryDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.categories.create(body.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(CategoryDto::from(category))))
}

/// `PATCH /admin/categories/{cat_id}` — Rename a category.
///
/// # Errors
///
/// Returns [`ServiceError`] if the category is missing or the name is taken.
#[utoipa::path(
    patch,
    path = "/admin/categories/{cat_id}",
    tag = "Categories",
    summary = "Rename a category",
    params(("cat_id" = i64, Path, description = "Category id")),
    request_body = NewCategoryDto,
    responses(
        (status = 200, description = "Category renamed", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Name already taken", body = ApiError),
    )
)]
pub async fn rename_category(
    State(state): State<AppState>,
    ApiPath(cat_id): ApiPath<i64>,
    ValidJson(body): ValidJson<NewCategoryDto>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.categories.rename(cat_id, body.name.trim()).await?;
    Ok(Json(CategoryDto::from(category)))
}

/// `DELETE /admin/categories/{cat_id}` — Delete an unused category.
///
/// # Errors
///
/// Returns [`ServiceError`] if the category is missing or still referenced.
#[utoipa::path(
    delete,
    path = "/admin/categories/{cat_id}",
    tag = "Categories",
    summary = "Delete a category",
    description = "Refused while any event references the category.",
    params(("cat_id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category in use", body = ApiError),
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(cat_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.categories.delete(cat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /categories` — List categories by id.
///
/// # Errors
///
/// Returns [`ServiceError`] on bad paging.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    summary = "List categories",
    params(
        ("from" = Option<i64>, Query, description = "Rows to skip, default 0"),
        ("size" = Option<i64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Categories ordered by id", body = Vec<CategoryDto>),
        (status = 400, description = "Bad paging", body = ApiError),
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.categories.list(params.page()?).await?;
    Ok(Json(
        categories.into_iter().map(CategoryDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /categories/{cat_id}` — Fetch a category.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/categories/{cat_id}",
    tag = "Categories",
    summary = "Fetch a category",
    params(("cat_id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError),
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(cat_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.categories.get(cat_id).await?;
    Ok(Json(CategoryDto::from(category)))
}

/// Category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/categories", post(create_category))
        .route(
            "/admin/categories/{cat_id}",
            patch(rename_category).delete(delete_category),
        )
        .route("/categories", get(list_categories))
        .route("/categories/{cat_id}", get(get_category))
}

//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! The main service is served at the root with `/admin` and
//! `/users/{user_id}` prefixes; the statistics service exposes `/hit` and
//! `/stats`. Both serve `/health`, and Swagger UI when the `swagger-ui`
//! feature is on.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod query;

use axum::Router;

use crate::app_state::{AppState, StatsState};

/// Builds the complete main-service router.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());
    with_swagger(router, openapi_main())
}

/// Builds the statistics-service router.
pub fn build_stats_router() -> Router<StatsState> {
    let router = Router::new()
        .merge(handlers::stats::routes())
        .merge(handlers::system::routes());
    with_swagger(router, openapi_stats())
}

fn openapi_main() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi;
    openapi::ApiDoc::openapi()
}

fn openapi_stats() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi;
    openapi::StatsApiDoc::openapi()
}

#[cfg(feature = "swagger-ui")]
fn with_swagger<S>(router: Router<S>, doc: utoipa::openapi::OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_swagger<S>(router: Router<S>, _doc: utoipa::openapi::OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
}

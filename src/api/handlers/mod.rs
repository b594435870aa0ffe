//! REST endpoint handlers organized by resource.

pub mod category;
pub mod comment;
pub mod compilation;
pub mod event;
pub mod request;
pub mod stats;
pub mod system;
pub mod user;

use axum::Router;

use crate::app_state::AppState;

/// Composes all main-service resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(category::routes())
        .merge(user::routes())
        .merge(event::routes())
        .merge(request::routes())
        .merge(comment::routes())
        .merge(compilation::routes())
}

//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::client::StatsClient;
use crate::domain::Clock;
use crate::persistence::{HitStore, Store};
use crate::service::{
    CategoryService, CommentService, CompilationService, EventService, RequestService,
    StatsService, UserService, ViewTracker,
};

/// State of the main service, available to handlers via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event engine.
    pub events: Arc<EventService>,
    /// Participation requests.
    pub requests: Arc<RequestService>,
    /// Categories.
    pub categories: Arc<CategoryService>,
    /// Users.
    pub users: Arc<UserService>,
    /// Comments.
    pub comments: Arc<CommentService>,
    /// Compilations.
    pub compilations: Arc<CompilationService>,
}

impl AppState {
    /// Wires every service over one store and statistics client.
    ///
    /// `app_name` is reported as the `app` of every public hit.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        stats: Arc<dyn StatsClient>,
        clock: Arc<dyn Clock>,
        app_name: &str,
    ) -> Self {
        let views = ViewTracker::new(stats, Arc::clone(&clock), app_name);
        Self {
            events: Arc::new(EventService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                views.clone(),
            )),
            requests: Arc::new(RequestService::new(Arc::clone(&store), Arc::clone(&clock))),
            categories: Arc::new(CategoryService::new(Arc::clone(&store))),
            users: Arc::new(UserService::new(Arc::clone(&store))),
            comments: Arc::new(CommentService::new(Arc::clone(&store), clock, views.clone())),
            compilations: Arc::new(CompilationService::new(store, views)),
        }
    }
}

/// State of the statistics service.
#[derive(Debug, Clone)]
pub struct StatsState {
    /// Hit ingestion and aggregation.
    pub stats: Arc<StatsService>,
}

impl StatsState {
    /// Wires the statistics service over `hits`.
    #[must_use]
    pub fn new(hits: Arc<dyn HitStore>) -> Self {
        Self {
            stats: Arc::new(StatsService::new(hits)),
        }
    }
}

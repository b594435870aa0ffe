//! Curated event compilations.

use std::collections::HashMap;
use std::sync::Arc;

use super::ViewTracker;
use crate::domain::compilation::{missing_ids, normalize_ids};
use crate::domain::{Compilation, CompilationPatch, Event, NewCompilation, Page};
use crate::error::ServiceError;
use crate::persistence::Store;

/// A compilation with its events resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationView {
    /// The compilation.
    pub compilation: Compilation,
    /// Its events by id, views attached.
    pub events: Vec<Event>,
}

/// Compilation operations.
#[derive(Debug, Clone)]
pub struct CompilationService {
    store: Arc<dyn Store>,
    views: ViewTracker,
}

impl CompilationService {
    /// Creates a new `CompilationService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, views: ViewTracker) -> Self {
        Self { store, views }
    }

    /// Creates a compilation.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] naming every listed event that does not exist.
    pub async fn create(&self, new: &NewCompilation) -> Result<CompilationView, ServiceError> {
        self.ensure_events_exist(&new.event_ids).await?;
        let compilation = self.store.insert_compilation(new).await?;
        tracing::info!(compilation_id = compilation.id, "compilation created");
        self.resolve_one(compilation).await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the compilation or a listed event does
    /// not exist.
    pub async fn update(
        &self,
        id: i64,
        patch: &CompilationPatch,
    ) -> Result<CompilationView, ServiceError> {
        if let Some(ids) = &patch.event_ids {
            self.ensure_events_exist(ids).await?;
        }
        let compilation = self
            .store
            .update_compilation(id, patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("Compilation", id))?;
        tracing::info!(compilation_id = id, "compilation updated");
        self.resolve_one(compilation).await
    }

    /// Deletes a compilation.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_compilation(id).await? {
            return Err(ServiceError::not_found("Compilation", id));
        }
        tracing::info!(compilation_id = id, "compilation deleted");
        Ok(())
    }

    /// Fetches a compilation.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn get(&self, id: i64) -> Result<CompilationView, ServiceError> {
        let compilation = self
            .store
            .find_compilation(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Compilation", id))?;
        self.resolve_one(compilation).await
    }

    /// Lists compilations by id, optionally only pinned or unpinned ones.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn list(
        &self,
        pinned: Option<bool>,
        page: Page,
    ) -> Result<Vec<CompilationView>, ServiceError> {
        let compilations = self.store.list_compilations(pinned, page).await?;
        self.resolve(compilations).await
    }

    async fn ensure_events_exist(&self, ids: &[i64]) -> Result<(), ServiceError> {
        let wanted = normalize_ids(ids);
        if wanted.is_empty() {
            return Ok(());
        }
        let found: Vec<i64> = self
            .store
            .find_events(&wanted)
            .await?
            .iter()
            .map(|e| e.id)
            .collect();
        let missing = missing_ids(&wanted, &found);
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Events with ids={missing:?} were not found"
            )));
        }
        Ok(())
    }

    async fn resolve_one(&self, compilation: Compilation) -> Result<CompilationView, ServiceError> {
        let mut views = self.resolve(vec![compilation]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::Internal("compilation vanished".to_string()))
    }

    /// Loads the events of all compilations and their views in one pass.
    async fn resolve(
        &self,
        compilations: Vec<Compilation>,
    ) -> Result<Vec<CompilationView>, ServiceError> {
        let ids: Vec<i64> = normalize_ids(
            &compilations
                .iter()
                .flat_map(|c| c.event_ids.iter().copied())
                .collect::<Vec<_>>(),
        );
        let mut events = self.store.find_events(&ids).await?;
        self.views.attach(&mut events).await;
        let events: HashMap<i64, Event> = events.into_iter().map(|e| (e.id, e)).collect();

        Ok(compilations
            .into_iter()
            .map(|compilation| {
                let events = compilation
                    .event_ids
                    .iter()
                    .filter_map(|id| events.get(id).cloned())
                    .collect();
                CompilationView { compilation, events }
            })
            .collect())
    }
}

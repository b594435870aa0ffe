//! Category administration and lookup.

use std::sync::Arc;

use crate::domain::{Category, Page};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Category operations.
#[derive(Debug, Clone)]
pub struct CategoryService {
    store: Arc<dyn Store>,
}

impl CategoryService {
    /// Creates a new `CategoryService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if the name is taken.
    pub async fn create(&self, name: &str) -> Result<Category, ServiceError> {
        let category = self.store.insert_category(name).await?;
        tracing::info!(category_id = category.id, name, "category created");
        Ok(category)
    }

    /// Renames a category.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if it does not exist.
    /// - [`ServiceError::IntegrityViolation`] if the name is taken.
    pub async fn rename(&self, id: i64, name: &str) -> Result<Category, ServiceError> {
        self.store
            .rename_category(id, name)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    /// Deletes an unused category.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if it does not exist.
    /// - [`ServiceError::IntegrityViolation`] if an event references it.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.get(id).await?;
        if self.store.count_events_in_category(id).await? > 0 {
            return Err(ServiceError::IntegrityViolation(format!(
                "The category id={id} is not empty"
            )));
        }
        if !self.store.delete_category(id).await? {
            return Err(ServiceError::not_found("Category", id));
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    /// Fetches a category.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn get(&self, id: i64) -> Result<Category, ServiceError> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    /// Lists categories by id.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn list(&self, page: Page) -> Result<Vec<Category>, ServiceError> {
        self.store.list_categories(page).await
    }
}

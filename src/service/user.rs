//! User administration.

use std::sync::Arc;

use crate::domain::{NewUser, Page, User};
use crate::error::ServiceError;
use crate::persistence::Store;

/// User operations.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if the e-mail is taken.
    pub async fn create(&self, user: &NewUser) -> Result<User, ServiceError> {
        let user = self.store.insert_user(user).await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Lists users by id, restricted to `ids` unless empty.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn list(&self, ids: &[i64], page: Page) -> Result<Vec<User>, ServiceError> {
        self.store.list_users(ids, page).await
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if it does not exist.
    /// - [`ServiceError::IntegrityViolation`] if anything still references it.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_user(id).await? {
            return Err(ServiceError::not_found("User", id));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }
}

//! Service layer: business operations over the stores.
//!
//! Each service resolves references, checks ownership, hands pure domain
//! rules to the transactional store methods and logs state changes. Views
//! are attached by [`ViewTracker`] on the way out.

pub mod category;
pub mod comment;
pub mod compilation;
pub mod event;
pub mod request;
pub mod stats;
pub mod user;
pub mod views;

pub use category::CategoryService;
pub use comment::{CommentService, CommentView};
pub use compilation::{CompilationService, CompilationView};
pub use event::EventService;
pub use request::RequestService;
pub use stats::StatsService;
pub use user::UserService;
pub use views::ViewTracker;

use crate::domain::{Event, User};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Loads a user or fails with not-found.
async fn require_user(store: &dyn Store, id: i64) -> Result<User, ServiceError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", id))
}

/// Loads an event or fails with not-found.
async fn require_event(store: &dyn Store, id: i64) -> Result<Event, ServiceError> {
    store
        .find_event(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Event", id))
}

/// Fails with unauthorized unless `user_id` created `event`.
fn ensure_initiator(event: &Event, user_id: i64) -> Result<(), ServiceError> {
    if event.initiator.id != user_id {
        return Err(ServiceError::Unauthorized(format!(
            "User id={user_id} is not the initiator of event id={}",
            event.id
        )));
    }
    Ok(())
}

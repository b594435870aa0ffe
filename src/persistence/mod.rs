//! Persistence layer: store traits with PostgreSQL and in-memory backends.
//!
//! One trait per aggregate, all object safe so services hold an
//! `Arc<dyn Store>`. Read-modify-write operations on events and requests
//! take the domain rule as a closure: the store loads the rows under a lock
//! (`SELECT ... FOR UPDATE` in Postgres, the table write lock in memory),
//! runs the closure, and commits only if it returns `Ok`.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod sql;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::search::{CommentField, CommentOrder, EventField, EventOrder};
use crate::domain::{
    Category, Comment, CommentDraft, Compilation, CompilationPatch, Coordinates, EndpointHit, Event,
    EventDraft, Location, NewCompilation, NewHit, NewUser, Page, ParticipationRequest, Predicate,
    RequestStatus, StatsQuery, User, ViewStats,
};
use crate::error::ServiceError;

pub use memory::{MemoryHitStore, MemoryStore};
pub use postgres::{PostgresHitStore, PostgresStore};

/// Mutation applied to a locked event.
pub type EventMutation<'a> = &'a (dyn Fn(&mut Event) -> Result<(), ServiceError> + Send + Sync);

/// Decides the status of a new request given the locked event and whether
/// the requester already applied.
pub type Admission<'a> =
    &'a (dyn Fn(&Event, bool) -> Result<RequestStatus, ServiceError> + Send + Sync);

/// Mutation applied to a locked request.
pub type RequestMutation<'a> =
    &'a (dyn Fn(&mut ParticipationRequest) -> Result<(), ServiceError> + Send + Sync);

/// Mutation applied to a locked event and the listed requests.
pub type BatchMutation<'a> = &'a (dyn Fn(&mut Event, &mut [ParticipationRequest]) -> Result<(), ServiceError>
          + Send
          + Sync);

/// Mutation applied to a locked comment.
pub type CommentMutation<'a> = &'a (dyn Fn(&mut Comment) -> Result<(), ServiceError> + Send + Sync);

/// User storage.
#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// Inserts a user.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if the e-mail is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User, ServiceError>;

    /// Fetches a user.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_user(&self, id: i64) -> Result<Option<User>, ServiceError>;

    /// Lists users ordered by id, restricted to `ids` unless empty.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_users(&self, ids: &[i64], page: Page) -> Result<Vec<User>, ServiceError>;

    /// Deletes a user; `false` if absent.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if events, requests or comments
    /// still reference the user.
    async fn delete_user(&self, id: i64) -> Result<bool, ServiceError>;
}

/// Category storage.
#[async_trait]
pub trait CategoryStore: Send + Sync + Debug {
    /// Inserts a category.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if the name is taken.
    async fn insert_category(&self, name: &str) -> Result<Category, ServiceError>;

    /// Renames a category; `None` if absent.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if the name is taken by another category.
    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, ServiceError>;

    /// Fetches a category.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_category(&self, id: i64) -> Result<Option<Category>, ServiceError>;

    /// Lists categories ordered by id.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_categories(&self, page: Page) -> Result<Vec<Category>, ServiceError>;

    /// Deletes a category; `false` if absent.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] if any event references it.
    async fn delete_category(&self, id: i64) -> Result<bool, ServiceError>;
}

/// Location storage.
#[async_trait]
pub trait LocationStore: Send + Sync + Debug {
    /// Always inserts a new row.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn insert_location(&self, at: Coordinates) -> Result<Location, ServiceError>;

    /// Reuses a row with exactly these coordinates, inserting one otherwise.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_or_insert_location(&self, at: Coordinates) -> Result<Location, ServiceError>;
}

/// Event storage.
#[async_trait]
pub trait EventStore: Send + Sync + Debug {
    /// Inserts a PENDING event with no confirmed participants.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] on dangling references.
    async fn insert_event(&self, draft: &EventDraft) -> Result<Event, ServiceError>;

    /// Fetches an event.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_event(&self, id: i64) -> Result<Option<Event>, ServiceError>;

    /// Fetches the events whose ids are listed, ordered by id.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_events(&self, ids: &[i64]) -> Result<Vec<Event>, ServiceError>;

    /// Lists events matching `filter`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_events(
        &self,
        filter: &Predicate<EventField>,
        order: EventOrder,
        page: Page,
    ) -> Result<Vec<Event>, ServiceError>;

    /// Locks the event, applies `mutation` and persists the result.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if absent; otherwise whatever `mutation` returns.
    async fn update_event(&self, id: i64, mutation: EventMutation<'_>) -> Result<Event, ServiceError>;

    /// Number of events in `category_id`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn count_events_in_category(&self, category_id: i64) -> Result<i64, ServiceError>;
}

/// Participation request storage.
#[async_trait]
pub trait RequestStore: Send + Sync + Debug {
    /// Locks the event, asks `admission` for the initial status and inserts
    /// the request, bumping the confirmed counter when it is CONFIRMED and
    /// the event has a participant limit.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the event is absent; otherwise whatever
    /// `admission` returns.
    async fn create_request(
        &self,
        event_id: i64,
        requester_id: i64,
        created: NaiveDateTime,
        admission: Admission<'_>,
    ) -> Result<ParticipationRequest, ServiceError>;

    /// Fetches a request.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_request(&self, id: i64) -> Result<Option<ParticipationRequest>, ServiceError>;

    /// Requests filed by `requester_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_requests_by_requester(
        &self,
        requester_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError>;

    /// Requests for `event_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_requests_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError>;

    /// Locks the request's event and the request, applies `mutation`, and
    /// releases a slot of a limited event if a CONFIRMED request leaves
    /// that status.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if absent; otherwise whatever `mutation` returns.
    async fn update_request(
        &self,
        id: i64,
        mutation: RequestMutation<'_>,
    ) -> Result<ParticipationRequest, ServiceError>;

    /// Locks the event and the listed requests belonging to it, applies
    /// `mutation`, and persists the event and every request.
    ///
    /// Returns the listed requests after the change, ordered by id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the event is absent; otherwise whatever
    /// `mutation` returns.
    async fn update_request_statuses(
        &self,
        event_id: i64,
        request_ids: &[i64],
        mutation: BatchMutation<'_>,
    ) -> Result<Vec<ParticipationRequest>, ServiceError>;
}

/// Comment storage.
#[async_trait]
pub trait CommentStore: Send + Sync + Debug {
    /// Inserts a PENDING comment.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] on dangling references.
    async fn insert_comment(&self, draft: &CommentDraft) -> Result<Comment, ServiceError>;

    /// Fetches a comment.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, ServiceError>;

    /// Lists comments matching `filter`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_comments(
        &self,
        filter: &Predicate<CommentField>,
        order: CommentOrder,
        page: Page,
    ) -> Result<Vec<Comment>, ServiceError>;

    /// Locks the comment, applies `mutation` and persists it.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if absent; otherwise whatever `mutation` returns.
    async fn update_comment(
        &self,
        id: i64,
        mutation: CommentMutation<'_>,
    ) -> Result<Comment, ServiceError>;

    /// Deletes a comment; `false` if absent.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn delete_comment(&self, id: i64) -> Result<bool, ServiceError>;
}

/// Compilation storage.
#[async_trait]
pub trait CompilationStore: Send + Sync + Debug {
    /// Inserts a compilation.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] on dangling event ids.
    async fn insert_compilation(&self, new: &NewCompilation) -> Result<Compilation, ServiceError>;

    /// Fetches a compilation.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn find_compilation(&self, id: i64) -> Result<Option<Compilation>, ServiceError>;

    /// Lists compilations ordered by id, filtered by `pinned` when given.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_compilations(
        &self,
        pinned: Option<bool>,
        page: Page,
    ) -> Result<Vec<Compilation>, ServiceError>;

    /// Applies `patch`; `None` if absent.
    ///
    /// # Errors
    ///
    /// [`ServiceError::IntegrityViolation`] on dangling event ids.
    async fn update_compilation(
        &self,
        id: i64,
        patch: &CompilationPatch,
    ) -> Result<Option<Compilation>, ServiceError>;

    /// Deletes a compilation; `false` if absent.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn delete_compilation(&self, id: i64) -> Result<bool, ServiceError>;
}

/// Everything the main service persists.
pub trait Store:
    UserStore + CategoryStore + LocationStore + EventStore + RequestStore + CommentStore + CompilationStore
{
}

impl<T> Store for T where
    T: UserStore
        + CategoryStore
        + LocationStore
        + EventStore
        + RequestStore
        + CommentStore
        + CompilationStore
{
}

/// Append-only hit log of the statistics service.
#[async_trait]
pub trait HitStore: Send + Sync + Debug {
    /// Appends a hit.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn insert_hit(&self, hit: &NewHit) -> Result<EndpointHit, ServiceError>;

    /// Aggregates hits by (app, uri), ordered by descending hits.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError>;
}

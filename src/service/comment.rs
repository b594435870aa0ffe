//! Comments on published events and their moderation.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ViewTracker, require_event, require_user};
use crate::domain::search::{CommentFilter, CommentOrder, published_comments_of};
use crate::domain::{Clock, Comment, CommentDraft, CommentStatus, Event, EventState, Page};
use crate::error::ServiceError;
use crate::persistence::Store;

/// A comment together with the event it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    /// The comment.
    pub comment: Comment,
    /// The commented event, views attached.
    pub event: Event,
}

/// Comment operations.
#[derive(Debug, Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    views: ViewTracker,
}

impl CommentService {
    /// Creates a new `CommentService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, views: ViewTracker) -> Self {
        Self { store, clock, views }
    }

    /// Posts a PENDING comment of `user_id` on a published event.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or event does not exist.
    /// - [`ServiceError::StateConflict`] if the event is not published.
    pub async fn create(
        &self,
        user_id: i64,
        event_id: i64,
        text: &str,
    ) -> Result<CommentView, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let event = require_event(self.store.as_ref(), event_id).await?;
        if event.state != EventState::Published {
            return Err(ServiceError::StateConflict(format!(
                "Event id={event_id} is not published and cannot be commented"
            )));
        }
        let comment = self
            .store
            .insert_comment(&CommentDraft {
                text: text.to_string(),
                commentator_id: user_id,
                event_id,
                created: self.clock.now(),
            })
            .await?;
        tracing::info!(comment_id = comment.id, event_id, user_id, "comment posted");
        self.with_event(comment).await
    }

    /// A comment written by `user_id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or comment does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not write it.
    pub async fn get_own(&self, user_id: i64, comment_id: i64) -> Result<CommentView, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let comment = self.require_comment(comment_id).await?;
        comment.ensure_author(user_id)?;
        self.with_event(comment).await
    }

    /// Comments written by `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the user does not exist.
    pub async fn list_own(
        &self,
        user_id: i64,
        page: Page,
    ) -> Result<Vec<CommentView>, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let filter = CommentFilter {
            commentator_ids: vec![user_id],
            ..CommentFilter::default()
        };
        let comments = self
            .store
            .list_comments(&filter.predicate()?, CommentOrder::Created, page)
            .await?;
        self.with_events(comments).await
    }

    /// Replaces the text of a comment of `user_id`; resubmits it for moderation.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or comment does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not write it.
    /// - [`ServiceError::StateConflict`] if it is already published.
    pub async fn edit_own(
        &self,
        user_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<CommentView, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let comment = self
            .store
            .update_comment(comment_id, &|comment: &mut Comment| comment.edit(user_id, text))
            .await?;
        tracing::info!(comment_id, user_id, "comment edited");
        self.with_event(comment).await
    }

    /// Published comments of an event, oldest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the event does not exist.
    pub async fn list_public(
        &self,
        event_id: i64,
        page: Page,
    ) -> Result<Vec<CommentView>, ServiceError> {
        require_event(self.store.as_ref(), event_id).await?;
        let comments = self
            .store
            .list_comments(&published_comments_of(event_id), CommentOrder::Created, page)
            .await?;
        self.with_events(comments).await
    }

    /// Publishes or declines a pending comment.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the comment does not exist.
    /// - [`ServiceError::StateConflict`] unless it is PENDING and `status`
    ///   is PUBLISHED or CANCELED.
    pub async fn moderate(
        &self,
        comment_id: i64,
        status: CommentStatus,
    ) -> Result<CommentView, ServiceError> {
        let comment = self
            .store
            .update_comment(comment_id, &|comment: &mut Comment| comment.moderate(status))
            .await?;
        tracing::info!(comment_id, status = %comment.status, "comment moderated");
        self.with_event(comment).await
    }

    /// Deletes a comment.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn delete(&self, comment_id: i64) -> Result<(), ServiceError> {
        if !self.store.delete_comment(comment_id).await? {
            return Err(ServiceError::not_found("Comment", comment_id));
        }
        tracing::info!(comment_id, "comment deleted");
        Ok(())
    }

    /// Admin search, ordered by id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadTime`] if the creation window is inverted.
    pub async fn search(
        &self,
        filter: &CommentFilter,
        page: Page,
    ) -> Result<Vec<CommentView>, ServiceError> {
        let comments = self
            .store
            .list_comments(&filter.predicate()?, CommentOrder::Id, page)
            .await?;
        self.with_events(comments).await
    }

    async fn require_comment(&self, id: i64) -> Result<Comment, ServiceError> {
        self.store
            .find_comment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", id))
    }

    async fn with_event(&self, comment: Comment) -> Result<CommentView, ServiceError> {
        let mut views = self.with_events(vec![comment]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::Internal("commented event vanished".to_string()))
    }

    /// Joins each comment with its event, fetching every event and its
    /// views once.
    async fn with_events(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>, ServiceError> {
        let mut ids: Vec<i64> = comments.iter().map(|c| c.event_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let mut events = self.store.find_events(&ids).await?;
        self.views.attach(&mut events).await;
        let events: HashMap<i64, Event> = events.into_iter().map(|e| (e.id, e)).collect();

        comments
            .into_iter()
            .map(|comment| {
                let event = events.get(&comment.event_id).cloned().ok_or_else(|| {
                    ServiceError::Internal(format!(
                        "event id={} of a comment is missing",
                        comment.event_id
                    ))
                })?;
                Ok(CommentView { comment, event })
            })
            .collect()
    }
}

//! Request engine: participation requests and their moderation.

use std::sync::Arc;

use super::{ensure_initiator, require_event, require_user};
use crate::domain::compilation::normalize_ids;
use crate::domain::request::{admission, apply_status_update, cancel};
use crate::domain::{
    Clock, Event, ParticipationRequest, RequestStatus, StatusUpdate, StatusUpdateOutcome,
};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Orchestrates participation requests.
///
/// Every operation that touches the confirmed counter runs inside a store
/// transaction holding the event row lock.
#[derive(Debug, Clone)]
pub struct RequestService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl RequestService {
    /// Creates a new `RequestService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Files a request of `user_id` to join `event_id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or event does not exist.
    /// - [`ServiceError::RequestConflict`] if a participation rule forbids it.
    pub async fn create(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<ParticipationRequest, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let request = self
            .store
            .create_request(
                event_id,
                user_id,
                self.clock.now(),
                &|event: &Event, dup: bool| admission(event, user_id, dup),
            )
            .await?;
        tracing::info!(
            request_id = request.id,
            event_id,
            user_id,
            status = %request.status,
            "participation requested"
        );
        Ok(request)
    }

    /// Requests filed by `user_id`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the user does not exist.
    pub async fn list_own(&self, user_id: i64) -> Result<Vec<ParticipationRequest>, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        self.store.list_requests_by_requester(user_id).await
    }

    /// Cancels a request of `user_id`, releasing its slot if it held one.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or request does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not file it.
    pub async fn cancel_own(
        &self,
        user_id: i64,
        request_id: i64,
    ) -> Result<ParticipationRequest, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let request = self
            .store
            .update_request(request_id, &|request: &mut ParticipationRequest| {
                cancel(request, user_id).map(|_| ())
            })
            .await?;
        tracing::info!(request_id, user_id, "participation request canceled");
        Ok(request)
    }

    /// Requests for an event of `owner_id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or event does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not create the event.
    pub async fn list_for_event(
        &self,
        owner_id: i64,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        require_user(self.store.as_ref(), owner_id).await?;
        let event = require_event(self.store.as_ref(), event_id).await?;
        ensure_initiator(&event, owner_id)?;
        self.store.list_requests_by_event(event_id).await
    }

    /// Confirms or rejects pending requests of an event of `owner_id`.
    ///
    /// The batch is all or nothing: the first rule violation rolls every
    /// change back.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user, event or a listed request
    ///   does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not create the event.
    /// - [`ServiceError::Validation`] if the event needs no confirmation, is
    ///   full, or a listed request is not PENDING.
    pub async fn update_statuses(
        &self,
        owner_id: i64,
        event_id: i64,
        request_ids: &[i64],
        target: StatusUpdate,
    ) -> Result<StatusUpdateOutcome, ServiceError> {
        require_user(self.store.as_ref(), owner_id).await?;
        let event = require_event(self.store.as_ref(), event_id).await?;
        ensure_initiator(&event, owner_id)?;

        let ids = normalize_ids(request_ids);
        let updated = self
            .store
            .update_request_statuses(
                event_id,
                &ids,
                &|event: &mut Event, requests: &mut [ParticipationRequest]| {
                    apply_status_update(event, requests, &ids, target).map(|_| ())
                },
            )
            .await?;

        // Every listed request was PENDING, so its new status tells the outcome.
        let (confirmed, rejected): (Vec<_>, Vec<_>) = updated
            .into_iter()
            .partition(|r| r.status == RequestStatus::Confirmed);
        tracing::info!(
            event_id,
            confirmed = confirmed.len(),
            rejected = rejected.len(),
            "participation requests moderated"
        );
        Ok(StatusUpdateOutcome { confirmed, rejected })
    }
}

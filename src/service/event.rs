//! Event engine: creation, owner and admin updates, searches.

use std::sync::Arc;

use super::{ViewTracker, ensure_initiator, require_event, require_user};
use crate::domain::event::ensure_lead_time;
use crate::domain::search::{AdminEventFilter, EventOrder, EventSort, PublicEventFilter, owned_by};
use crate::domain::{
    AdminStateAction, Clock, Event, EventDraft, EventPatch, EventState, NewEvent, OwnerStateAction,
    Page, Resolved,
};
use crate::error::ServiceError;
use crate::persistence::Store;

/// Orchestrates every event operation.
///
/// Mutations follow the pattern: resolve references outside the lock,
/// then let the store run the pure domain rule on the locked row.
#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    views: ViewTracker,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, views: ViewTracker) -> Self {
        Self { store, clock, views }
    }

    /// Creates a PENDING event owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BadTime`] if the event is less than two hours away.
    /// - [`ServiceError::NotFound`] if the user or category does not exist.
    pub async fn create(&self, user_id: i64, new: NewEvent) -> Result<Event, ServiceError> {
        let now = self.clock.now();
        ensure_lead_time(new.event_date, now)?;
        require_user(self.store.as_ref(), user_id).await?;
        let category = self
            .store
            .find_category(new.category_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", new.category_id))?;
        let location = self.store.insert_location(new.location).await?;

        let event = self
            .store
            .insert_event(&EventDraft {
                title: new.title,
                annotation: new.annotation,
                description: new.description,
                category_id: category.id,
                initiator_id: user_id,
                location_id: location.id,
                event_date: new.event_date,
                created_on: now,
                paid: new.paid,
                participant_limit: new.participant_limit,
                request_moderation: new.request_moderation,
            })
            .await?;
        tracing::info!(event_id = event.id, user_id, "event created");
        Ok(event)
    }

    /// Returns an event of `user_id` with views.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user or event does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not create it.
    pub async fn get_owned(&self, user_id: i64, event_id: i64) -> Result<Event, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let event = require_event(self.store.as_ref(), event_id).await?;
        ensure_initiator(&event, user_id)?;
        Ok(self.with_views(event).await)
    }

    /// Lists the events of `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the user does not exist.
    pub async fn list_owned(&self, user_id: i64, page: Page) -> Result<Vec<Event>, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let mut events = self
            .store
            .list_events(&owned_by(user_id), EventOrder::CreatedOn, page)
            .await?;
        self.views.attach(&mut events).await;
        Ok(events)
    }

    /// Applies an owner's patch.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the user, event or new category does not exist.
    /// - [`ServiceError::Unauthorized`] if the user did not create the event.
    /// - [`ServiceError::StateConflict`] if the event is published.
    /// - [`ServiceError::BadTime`] if a new date is less than two hours away.
    pub async fn update_by_owner(
        &self,
        user_id: i64,
        event_id: i64,
        patch: EventPatch<OwnerStateAction>,
    ) -> Result<Event, ServiceError> {
        require_user(self.store.as_ref(), user_id).await?;
        let current = require_event(self.store.as_ref(), event_id).await?;
        ensure_initiator(&current, user_id)?;
        if current.state == EventState::Published {
            return Err(ServiceError::StateConflict(
                "Only pending or canceled events can be changed".to_string(),
            ));
        }
        let resolved = self.resolve(&patch).await?;
        let now = self.clock.now();

        let event = self
            .store
            .update_event(event_id, &|event: &mut Event| {
                ensure_initiator(event, user_id)?;
                event.apply_owner_update(&patch, resolved.clone(), now)
            })
            .await?;
        tracing::info!(event_id, user_id, state = %event.state, "event updated by owner");
        Ok(self.with_views(event).await)
    }

    /// Applies an admin's patch, publishing or rejecting when asked.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the event or new category does not exist.
    /// - [`ServiceError::StateConflict`] on a forbidden transition.
    /// - [`ServiceError::BadTime`] on a date rule violation.
    /// - [`ServiceError::Validation`] if the new limit is below the confirmed count.
    pub async fn update_by_admin(
        &self,
        event_id: i64,
        patch: EventPatch<AdminStateAction>,
    ) -> Result<Event, ServiceError> {
        require_event(self.store.as_ref(), event_id).await?;
        let resolved = self.resolve(&patch).await?;
        let now = self.clock.now();

        let event = self
            .store
            .update_event(event_id, &|event: &mut Event| {
                event.apply_admin_update(&patch, resolved.clone(), now)
            })
            .await?;
        match patch.state_action {
            Some(AdminStateAction::PublishEvent) => tracing::info!(event_id, "event published"),
            Some(AdminStateAction::RejectEvent) => tracing::info!(event_id, "event rejected"),
            None => tracing::info!(event_id, "event updated by admin"),
        }
        Ok(self.with_views(event).await)
    }

    /// Admin search, oldest first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadTime`] if the date window is inverted.
    pub async fn list_by_admin(
        &self,
        filter: &AdminEventFilter,
        page: Page,
    ) -> Result<Vec<Event>, ServiceError> {
        let predicate = filter.predicate()?;
        let mut events = self
            .store
            .list_events(&predicate, EventOrder::CreatedOn, page)
            .await?;
        self.views.attach(&mut events).await;
        Ok(events)
    }

    /// Returns a published event and records the read.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the event does not exist or is not published.
    pub async fn get_public(&self, event_id: i64, ip: &str) -> Result<Event, ServiceError> {
        let event = require_event(self.store.as_ref(), event_id).await?;
        if event.state != EventState::Published {
            return Err(ServiceError::not_found("Event", event_id));
        }
        self.views.record_hit(&event.uri(), ip).await;
        Ok(self.with_views(event).await)
    }

    /// Public search over published events; records the read of `uri`.
    ///
    /// Sorting by views orders the whole filtered set before paging since
    /// views are not stored with the events.
    ///
    /// # Errors
    ///
    /// [`ServiceError::BadTime`] if the date window is inverted.
    pub async fn list_public(
        &self,
        filter: &PublicEventFilter,
        page: Page,
        ip: &str,
        uri: &str,
    ) -> Result<Vec<Event>, ServiceError> {
        let predicate = filter.predicate()?;
        self.views.record_hit(uri, ip).await;

        match filter.sort {
            Some(EventSort::Views) => {
                let mut events = self
                    .store
                    .list_events(&predicate, EventOrder::Id, Page::unbounded())
                    .await?;
                self.views.attach(&mut events).await;
                events.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.id.cmp(&b.id)));
                Ok(page.apply(events))
            }
            Some(EventSort::EventDate) | None => {
                let order = if filter.sort.is_some() {
                    EventOrder::EventDate
                } else {
                    EventOrder::Id
                };
                let mut events = self.store.list_events(&predicate, order, page).await?;
                self.views.attach(&mut events).await;
                Ok(events)
            }
        }
    }

    async fn with_views(&self, mut event: Event) -> Event {
        self.views.attach(std::slice::from_mut(&mut event)).await;
        event
    }

    async fn resolve<A>(&self, patch: &EventPatch<A>) -> Result<Resolved, ServiceError>
    where
        A: Sync,
    {
        let category = match patch.category_id {
            Some(id) => Some(
                self.store
                    .find_category(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Category", id))?,
            ),
            None => None,
        };
        let location = match patch.location {
            Some(at) => Some(self.store.find_or_insert_location(at).await?),
            None => None,
        };
        Ok(Resolved { category, location })
    }
}

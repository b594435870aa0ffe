//! The event aggregate and its state machine.
//!
//! ```text
//!         PENDING ── admin:PUBLISH_EVENT ──► PUBLISHED (publishedOn := now)
//!            │
//!            ├── admin:REJECT_EVENT ──────► CANCELED
//!            ├── owner:CANCEL_REVIEW ─────► CANCELED
//!            │
//!         CANCELED ── owner:SEND_TO_REVIEW ─► PENDING
//! ```
//!
//! Nothing leaves PUBLISHED. All rules here are pure: the caller loads the
//! event under a row lock, applies one of the `apply_*` methods and persists
//! the result only when it returns `Ok`.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::time;
use super::user::{Category, Coordinates, Location, UserShort};
use crate::error::ServiceError;

/// Minimum distance between "now" and the event date on create and update.
pub const MIN_LEAD_HOURS: i64 = 2;

/// Minimum distance between publication and the event date.
pub const PUBLISH_LEAD_HOURS: i64 = 1;

/// Lifecycle state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    /// Awaiting moderation.
    Pending,
    /// Visible to the public.
    Published,
    /// Rejected by an admin or withdrawn by the owner.
    Canceled,
}

impl EventState {
    /// Stored and wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Published => "PUBLISHED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PUBLISHED" => Ok(Self::Published),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(ServiceError::BadRequest(format!("unknown event state: {other}"))),
        }
    }
}

/// State transitions an owner may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerStateAction {
    /// CANCELED → PENDING.
    SendToReview,
    /// Withdraw from moderation.
    CancelReview,
}

/// State transitions an admin may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStateAction {
    /// PENDING → PUBLISHED.
    PublishEvent,
    /// Anything but PUBLISHED → CANCELED.
    RejectEvent,
}

/// An event with its category, initiator and location resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Store-assigned id.
    pub id: i64,
    /// Title, 3..120 chars.
    pub title: String,
    /// Short summary, 20..2000 chars.
    pub annotation: String,
    /// Full description, 20..7000 chars.
    pub description: String,
    /// Category the event belongs to.
    pub category: Category,
    /// User who created the event.
    pub initiator: UserShort,
    /// Venue.
    pub location: Location,
    /// When the event takes place.
    pub event_date: NaiveDateTime,
    /// When the event was created.
    pub created_on: NaiveDateTime,
    /// When the event was published; `None` until then.
    pub published_on: Option<NaiveDateTime>,
    /// Whether participation is paid. Metadata only.
    pub paid: bool,
    /// Maximum confirmed participants; `0` means unlimited.
    pub participant_limit: i64,
    /// Whether requests need the initiator's confirmation.
    pub request_moderation: bool,
    /// Lifecycle state.
    pub state: EventState,
    /// Number of CONFIRMED requests.
    pub confirmed_requests: i64,
    /// Unique views; computed on read, never stored.
    pub views: i64,
}

/// Everything needed to insert a new event row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Title.
    pub title: String,
    /// Short summary.
    pub annotation: String,
    /// Full description.
    pub description: String,
    /// Resolved category.
    pub category_id: i64,
    /// Creating user.
    pub initiator_id: i64,
    /// Stored location.
    pub location_id: i64,
    /// When the event takes place.
    pub event_date: NaiveDateTime,
    /// Creation time.
    pub created_on: NaiveDateTime,
    /// Paid flag.
    pub paid: bool,
    /// Participant limit, `0` = unlimited.
    pub participant_limit: i64,
    /// Moderation flag.
    pub request_moderation: bool,
}

/// A new event as submitted by its initiator.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Title.
    pub title: String,
    /// Short summary.
    pub annotation: String,
    /// Full description.
    pub description: String,
    /// Category id to resolve.
    pub category_id: i64,
    /// Venue position.
    pub location: Coordinates,
    /// When the event takes place.
    pub event_date: NaiveDateTime,
    /// Paid flag.
    pub paid: bool,
    /// Participant limit, `0` = unlimited.
    pub participant_limit: i64,
    /// Moderation flag.
    pub request_moderation: bool,
}

/// A partial update; `None` leaves the field as is.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch<A> {
    /// New title.
    pub title: Option<String>,
    /// New summary.
    pub annotation: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category id.
    pub category_id: Option<i64>,
    /// New venue position.
    pub location: Option<Coordinates>,
    /// New event date.
    pub event_date: Option<NaiveDateTime>,
    /// New paid flag.
    pub paid: Option<bool>,
    /// New participant limit.
    pub participant_limit: Option<i64>,
    /// New moderation flag.
    pub request_moderation: Option<bool>,
    /// Requested state transition.
    pub state_action: Option<A>,
}

impl<A> Default for EventPatch<A> {
    fn default() -> Self {
        Self {
            title: None,
            annotation: None,
            description: None,
            category_id: None,
            location: None,
            event_date: None,
            paid: None,
            participant_limit: None,
            request_moderation: None,
            state_action: None,
        }
    }
}

/// References of a patch already resolved against the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    /// Category named by `category_id`.
    pub category: Option<Category>,
    /// Location matching `location`.
    pub location: Option<Location>,
}

/// URI under which the public detail of event `id` is served and counted.
#[must_use]
pub fn event_uri(id: i64) -> String {
    format!("/events/{id}")
}

/// Checks that `event_date` is at least two hours after `now`.
///
/// # Errors
///
/// Returns [`ServiceError::BadTime`] otherwise.
pub fn ensure_lead_time(event_date: NaiveDateTime, now: NaiveDateTime) -> Result<(), ServiceError> {
    if event_date < now + Duration::hours(MIN_LEAD_HOURS) {
        return Err(ServiceError::BadTime(format!(
            "Field: eventDate. Error: must be at least {MIN_LEAD_HOURS} hours in the future. Value: {}",
            time::format(&event_date)
        )));
    }
    Ok(())
}

impl Event {
    /// URI of the public detail page.
    #[must_use]
    pub fn uri(&self) -> String {
        event_uri(self.id)
    }

    /// `true` once every slot is taken. Unlimited events are never full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.participant_limit > 0 && self.confirmed_requests >= self.participant_limit
    }

    /// Applies an owner's patch.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::StateConflict`] if the event is already published.
    /// - [`ServiceError::BadTime`] if a supplied date is less than two hours away.
    pub fn apply_owner_update(
        &mut self,
        patch: &EventPatch<OwnerStateAction>,
        resolved: Resolved,
        now: NaiveDateTime,
    ) -> Result<(), ServiceError> {
        if self.state == EventState::Published {
            return Err(ServiceError::StateConflict(
                "Only pending or canceled events can be changed".to_string(),
            ));
        }
        if let Some(date) = patch.event_date {
            ensure_lead_time(date, now)?;
        }
        self.apply_fields(patch, resolved);
        match patch.state_action {
            Some(OwnerStateAction::SendToReview) => self.state = EventState::Pending,
            Some(OwnerStateAction::CancelReview) => self.state = EventState::Canceled,
            None => {}
        }
        Ok(())
    }

    /// Applies an admin's patch, including publication and rejection.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BadTime`] if a supplied date is less than two hours
    ///   away, or if publishing would leave less than one hour before the event.
    /// - [`ServiceError::StateConflict`] when publishing a non-pending event or
    ///   rejecting a published one.
    /// - [`ServiceError::Validation`] if the new limit is below the number of
    ///   already confirmed participants.
    pub fn apply_admin_update(
        &mut self,
        patch: &EventPatch<AdminStateAction>,
        resolved: Resolved,
        now: NaiveDateTime,
    ) -> Result<(), ServiceError> {
        if let Some(date) = patch.event_date {
            ensure_lead_time(date, now)?;
        }
        if let Some(limit) = patch.participant_limit
            && limit > 0
            && limit < self.confirmed_requests
        {
            return Err(ServiceError::Validation(format!(
                "participantLimit {limit} is below the {} already confirmed participants",
                self.confirmed_requests
            )));
        }
        match patch.state_action {
            Some(AdminStateAction::PublishEvent) => {
                if self.state != EventState::Pending {
                    return Err(ServiceError::StateConflict(format!(
                        "Cannot publish the event because it's not in the right state: {}",
                        self.state
                    )));
                }
                let event_date = patch.event_date.unwrap_or(self.event_date);
                if event_date < now + Duration::hours(PUBLISH_LEAD_HOURS) {
                    return Err(ServiceError::BadTime(format!(
                        "Event date {} must be at least {PUBLISH_LEAD_HOURS} hour after publication",
                        time::format(&event_date)
                    )));
                }
            }
            Some(AdminStateAction::RejectEvent) => {
                if self.state == EventState::Published {
                    return Err(ServiceError::StateConflict(
                        "Cannot reject the event because it's already published".to_string(),
                    ));
                }
            }
            None => {}
        }

        self.apply_fields(patch, resolved);
        match patch.state_action {
            Some(AdminStateAction::PublishEvent) => {
                self.state = EventState::Published;
                self.published_on = Some(now);
            }
            Some(AdminStateAction::RejectEvent) => self.state = EventState::Canceled,
            None => {}
        }
        Ok(())
    }

    /// Resets the confirmed counter from the `confirmed` requests the event
    /// actually holds, after its participant limit changed. Unlimited events
    /// keep no count.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if a positive limit is below
    /// `confirmed`.
    pub fn recount_confirmed(&mut self, confirmed: i64) -> Result<(), ServiceError> {
        if self.participant_limit == 0 {
            self.confirmed_requests = 0;
            return Ok(());
        }
        if confirmed > self.participant_limit {
            return Err(ServiceError::Validation(format!(
                "participantLimit {} is below the {confirmed} already confirmed participants",
                self.participant_limit
            )));
        }
        self.confirmed_requests = confirmed;
        Ok(())
    }

    fn apply_fields<A>(&mut self, patch: &EventPatch<A>, resolved: Resolved) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(annotation) = &patch.annotation {
            self.annotation.clone_from(annotation);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(category) = resolved.category {
            self.category = category;
        }
        if let Some(location) = resolved.location {
            self.location = location;
        }
        if let Some(date) = patch.event_date {
            self.event_date = date;
        }
        if let Some(paid) = patch.paid {
            self.paid = paid;
        }
        if let Some(limit) = patch.participant_limit {
            self.participant_limit = limit;
        }
        if let Some(moderation) = patch.request_moderation {
            self.request_moderation = moderation;
        }
    }
}

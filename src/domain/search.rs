//! Search filters for events and comments.
//!
//! Each filter turns its optional parameters into a [`Predicate`]: supplied,
//! non-empty parameters become leaves and are combined with AND; omitted
//! ones add nothing.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::comment::{Comment, CommentStatus};
use super::event::{Event, EventState};
use super::filter::{Field, Predicate, Record, Value, time_window};
use crate::error::ServiceError;

// ── Events ──

/// Filterable event columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    /// Event id.
    Id,
    /// Initiator id.
    InitiatorId,
    /// Category id.
    CategoryId,
    /// Lifecycle state.
    State,
    /// Event date.
    EventDate,
    /// Creation time.
    CreatedOn,
    /// Paid flag.
    Paid,
    /// Summary text.
    Annotation,
    /// Description text.
    Description,
    /// Participant limit.
    ParticipantLimit,
    /// Confirmed participants.
    ConfirmedRequests,
}

impl Field for EventField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "e.id",
            Self::InitiatorId => "e.initiator_id",
            Self::CategoryId => "e.category_id",
            Self::State => "e.state",
            Self::EventDate => "e.event_date",
            Self::CreatedOn => "e.created_on",
            Self::Paid => "e.paid",
            Self::Annotation => "e.annotation",
            Self::Description => "e.description",
            Self::ParticipantLimit => "e.participant_limit",
            Self::ConfirmedRequests => "e.confirmed_requests",
        }
    }
}

impl Record<EventField> for Event {
    fn value(&self, field: EventField) -> Value {
        match field {
            EventField::Id => Value::Int(self.id),
            EventField::InitiatorId => Value::Int(self.initiator.id),
            EventField::CategoryId => Value::Int(self.category.id),
            EventField::State => Value::from(self.state.as_str()),
            EventField::EventDate => Value::Timestamp(self.event_date),
            EventField::CreatedOn => Value::Timestamp(self.created_on),
            EventField::Paid => Value::Bool(self.paid),
            EventField::Annotation => Value::Text(self.annotation.clone()),
            EventField::Description => Value::Text(self.description.clone()),
            EventField::ParticipantLimit => Value::Int(self.participant_limit),
            EventField::ConfirmedRequests => Value::Int(self.confirmed_requests),
        }
    }
}

/// Row order of an event listing. Ties break on id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrder {
    /// Ascending creation time.
    CreatedOn,
    /// Ascending event date.
    EventDate,
    /// Ascending id.
    Id,
}

impl EventOrder {
    /// SQL `ORDER BY` list.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::CreatedOn => "e.created_on ASC, e.id ASC",
            Self::EventDate => "e.event_date ASC, e.id ASC",
            Self::Id => "e.id ASC",
        }
    }

    /// Sorts events in memory the same way.
    pub fn sort(self, events: &mut [Event]) {
        match self {
            Self::CreatedOn => events.sort_by_key(|e| (e.created_on, e.id)),
            Self::EventDate => events.sort_by_key(|e| (e.event_date, e.id)),
            Self::Id => events.sort_by_key(|e| e.id),
        }
    }
}

/// Sort key of the public listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSort {
    /// Ascending event date.
    EventDate,
    /// Descending views.
    Views,
}

impl FromStr for EventSort {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EVENT_DATE" => Ok(Self::EventDate),
            "VIEWS" => Ok(Self::Views),
            other => Err(ServiceError::BadRequest(format!("unknown sort: {other}"))),
        }
    }
}

/// Events owned by `user_id`.
#[must_use]
pub fn owned_by(user_id: i64) -> Predicate<EventField> {
    Predicate::eq(EventField::InitiatorId, user_id)
}

/// Parameters of the admin event search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminEventFilter {
    /// Initiator ids.
    pub users: Vec<i64>,
    /// Accepted states.
    pub states: Vec<EventState>,
    /// Category ids.
    pub categories: Vec<i64>,
    /// Earliest event date.
    pub range_start: Option<NaiveDateTime>,
    /// Latest event date.
    pub range_end: Option<NaiveDateTime>,
}

impl AdminEventFilter {
    /// Builds the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadTime`] if `range_start > range_end`.
    pub fn predicate(&self) -> Result<Predicate<EventField>, ServiceError> {
        let window = time_window(EventField::EventDate, self.range_start, self.range_end)?;
        Ok(Predicate::all_of([
            Predicate::in_list(EventField::InitiatorId, self.users.iter().copied()),
            Predicate::in_list(EventField::State, self.states.iter().map(|s| s.as_str())),
            Predicate::in_list(EventField::CategoryId, self.categories.iter().copied()),
            window,
        ]))
    }
}

/// Parameters of the public event search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicEventFilter {
    /// Case-insensitive text matched against annotation or description.
    pub text: Option<String>,
    /// Category ids.
    pub categories: Vec<i64>,
    /// Paid flag.
    pub paid: Option<bool>,
    /// Earliest event date.
    pub range_start: Option<NaiveDateTime>,
    /// Latest event date.
    pub range_end: Option<NaiveDateTime>,
    /// Only events with free slots.
    pub only_available: bool,
    /// Sort key.
    pub sort: Option<EventSort>,
}

impl PublicEventFilter {
    /// Builds the predicate; published events only.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadTime`] if `range_start > range_end`.
    pub fn predicate(&self) -> Result<Predicate<EventField>, ServiceError> {
        let window = time_window(EventField::EventDate, self.range_start, self.range_end)?;
        let text = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                Predicate::contains(EventField::Annotation, t)
                    .or(Predicate::contains(EventField::Description, t))
            });
        let available = self.only_available.then(|| {
            Predicate::eq(EventField::ParticipantLimit, 0_i64).or(Predicate::FieldLessThan {
                left: EventField::ConfirmedRequests,
                right: EventField::ParticipantLimit,
            })
        });
        Ok(Predicate::all_of([
            Some(Predicate::eq(EventField::State, EventState::Published.as_str())),
            text,
            Predicate::in_list(EventField::CategoryId, self.categories.iter().copied()),
            self.paid.map(|paid| Predicate::eq(EventField::Paid, paid)),
            window,
            available,
        ]))
    }
}

// ── Comments ──

/// Filterable comment columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    /// Comment id.
    Id,
    /// Body text.
    Text,
    /// Author id.
    CommentatorId,
    /// Event id.
    EventId,
    /// Creation time.
    Created,
    /// Moderation status.
    Status,
}

impl Field for CommentField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "c.id",
            Self::Text => "c.text",
            Self::CommentatorId => "c.commentator_id",
            Self::EventId => "c.event_id",
            Self::Created => "c.created",
            Self::Status => "c.status",
        }
    }
}

impl Record<CommentField> for Comment {
    fn value(&self, field: CommentField) -> Value {
        match field {
            CommentField::Id => Value::Int(self.id),
            CommentField::Text => Value::Text(self.text.clone()),
            CommentField::CommentatorId => Value::Int(self.commentator.id),
            CommentField::EventId => Value::Int(self.event_id),
            CommentField::Created => Value::Timestamp(self.created),
            CommentField::Status => Value::from(self.status.as_str()),
        }
    }
}

/// Row order of a comment listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    /// Ascending id.
    Id,
    /// Ascending creation time.
    Created,
}

impl CommentOrder {
    /// SQL `ORDER BY` list.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Id => "c.id ASC",
            Self::Created => "c.created ASC, c.id ASC",
        }
    }

    /// Sorts comments in memory the same way.
    pub fn sort(self, comments: &mut [Comment]) {
        match self {
            Self::Id => comments.sort_by_key(|c| c.id),
            Self::Created => comments.sort_by_key(|c| (c.created, c.id)),
        }
    }
}

/// Parameters of the admin comment search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    /// Comment ids.
    pub ids: Vec<i64>,
    /// Case-insensitive text.
    pub text: Option<String>,
    /// Author ids.
    pub commentator_ids: Vec<i64>,
    /// Event ids.
    pub event_ids: Vec<i64>,
    /// Earliest creation time.
    pub range_start: Option<NaiveDateTime>,
    /// Latest creation time.
    pub range_end: Option<NaiveDateTime>,
    /// Moderation status.
    pub status: Option<CommentStatus>,
}

impl CommentFilter {
    /// Builds the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadTime`] if `range_start > range_end`.
    pub fn predicate(&self) -> Result<Predicate<CommentField>, ServiceError> {
        let window = time_window(CommentField::Created, self.range_start, self.range_end)?;
        Ok(Predicate::all_of([
            Predicate::in_list(CommentField::Id, self.ids.iter().copied()),
            self.text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Predicate::contains(CommentField::Text, t)),
            Predicate::in_list(CommentField::CommentatorId, self.commentator_ids.iter().copied()),
            Predicate::in_list(CommentField::EventId, self.event_ids.iter().copied()),
            window,
            self.status.map(|s| Predicate::eq(CommentField::Status, s.as_str())),
        ]))
    }
}

/// Published comments on `event_id`.
#[must_use]
pub fn published_comments_of(event_id: i64) -> Predicate<CommentField> {
    Predicate::all_of([
        Some(Predicate::eq(CommentField::EventId, event_id)),
        Some(Predicate::eq(CommentField::Status, CommentStatus::Published.as_str())),
    ])
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::tests::{at, sample_event};

    fn published(id: i64) -> Event {
        Event {
            id,
            state: EventState::Published,
            ..sample_event()
        }
    }

    #[test]
    fn public_filter_never_matches_unpublished() {
        let Ok(p) = PublicEventFilter::default().predicate() else {
            panic!("predicate");
        };
        assert!(p.matches(&published(1)));
        assert!(!p.matches(&sample_event()));
    }

    #[test]
    fn public_text_matches_annotation_or_description() {
        let filter = PublicEventFilter {
            text: Some("IMPROVISATION".to_string()),
            ..PublicEventFilter::default()
        };
        let Ok(p) = filter.predicate() else {
            panic!("predicate");
        };
        assert!(p.matches(&published(1)));

        let filter = PublicEventFilter {
            text: Some("opera".to_string()),
            ..PublicEventFilter::default()
        };
        let Ok(p) = filter.predicate() else {
            panic!("predicate");
        };
        assert!(!p.matches(&published(1)));
    }

    #[test]
    fn only_available_treats_zero_limit_as_unlimited() {
        let filter = PublicEventFilter {
            only_available: true,
            ..PublicEventFilter::default()
        };
        let Ok(p) = filter.predicate() else {
            panic!("predicate");
        };
        let unlimited = Event {
            confirmed_requests: 50,
            ..published(1)
        };
        let full = Event {
            participant_limit: 2,
            confirmed_requests: 2,
            ..published(2)
        };
        let open = Event {
            participant_limit: 2,
            confirmed_requests: 1,
            ..published(3)
        };
        assert!(p.matches(&unlimited));
        assert!(!p.matches(&full));
        assert!(p.matches(&open));
    }

    #[test]
    fn admin_filter_combines_with_and() {
        let filter = AdminEventFilter {
            users: vec![10],
            states: vec![EventState::Pending],
            categories: vec![],
            range_start: Some(at("2024-06-10 00:00:00")),
            range_end: Some(at("2024-06-11 00:00:00")),
        };
        let Ok(p) = filter.predicate() else {
            panic!("predicate");
        };
        assert!(p.matches(&sample_event()));
        assert!(!p.matches(&published(1)));
    }

    #[test]
    fn admin_filter_rejects_inverted_window() {
        let filter = AdminEventFilter {
            range_start: Some(at("2024-06-11 00:00:00")),
            range_end: Some(at("2024-06-10 00:00:00")),
            ..AdminEventFilter::default()
        };
        assert!(matches!(filter.predicate(), Err(ServiceError::BadTime(_))));
    }

    #[test]
    fn event_order_sorts_by_created_then_id() {
        let mut events = vec![
            Event {
                id: 2,
                ..sample_event()
            },
            Event {
                id: 1,
                created_on: at("2024-06-01 10:00:00"),
                ..sample_event()
            },
            Event {
                id: 3,
                ..sample_event()
            },
        ];
        EventOrder::CreatedOn.sort(&mut events);
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}

//! Database rows and their conversion into domain records.

use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::domain::{
    Category, Comment, EndpointHit, Event, Location, ParticipationRequest, User, UserShort,
    ViewStats,
};
use crate::error::ServiceError;

/// Columns selected for an [`EventRow`]; expects `events e` joined with
/// `categories c`, `users u` and `locations l`.
pub const EVENT_COLUMNS: &str = "e.id, e.title, e.annotation, e.description, e.event_date, \
     e.created_on, e.published_on, e.paid, e.participant_limit, e.request_moderation, e.state, \
     e.confirmed_requests, c.id AS category_id, c.name AS category_name, \
     u.id AS initiator_id, u.name AS initiator_name, l.id AS location_id, l.lat, l.lon";

/// Joins resolving the references of an event aliased `e`.
pub const EVENT_JOINS: &str = "JOIN categories c ON c.id = e.category_id \
     JOIN users u ON u.id = e.initiator_id \
     JOIN locations l ON l.id = e.location_id";

/// Columns selected for a [`CommentRow`]; expects `comments c` joined with `users u`.
pub const COMMENT_COLUMNS: &str =
    "c.id, c.text, c.event_id, c.created, c.status, u.id AS commentator_id, u.name AS commentator_name";

/// Join resolving the author of a comment aliased `c`.
pub const COMMENT_JOINS: &str = "JOIN users u ON u.id = c.commentator_id";

/// Columns of a [`RequestRow`].
pub const REQUEST_COLUMNS: &str = "id, event_id, requester_id, created, status";

/// A row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique e-mail.
    pub email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

/// A row of the `categories` table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    /// Primary key.
    pub id: i64,
    /// Unique name.
    pub name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// A row of the `locations` table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    /// Primary key.
    pub id: i64,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            lat: row.lat,
            lon: row.lon,
        }
    }
}

/// An event joined with its category, initiator and location.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    /// Primary key.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Summary.
    pub annotation: String,
    /// Description.
    pub description: String,
    /// Event date.
    pub event_date: NaiveDateTime,
    /// Creation time.
    pub created_on: NaiveDateTime,
    /// Publication time.
    pub published_on: Option<NaiveDateTime>,
    /// Paid flag.
    pub paid: bool,
    /// Participant limit.
    pub participant_limit: i64,
    /// Moderation flag.
    pub request_moderation: bool,
    /// State as text.
    pub state: String,
    /// Confirmed counter.
    pub confirmed_requests: i64,
    /// Joined category id.
    pub category_id: i64,
    /// Joined category name.
    pub category_name: String,
    /// Joined initiator id.
    pub initiator_id: i64,
    /// Joined initiator name.
    pub initiator_name: String,
    /// Joined location id.
    pub location_id: i64,
    /// Joined latitude.
    pub lat: f64,
    /// Joined longitude.
    pub lon: f64,
}

impl TryFrom<EventRow> for Event {
    type Error = ServiceError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse()
            .map_err(|_| ServiceError::Persistence(format!("corrupt event state: {}", row.state)))?;
        Ok(Self {
            id: row.id,
            title: row.title,
            annotation: row.annotation,
            description: row.description,
            category: Category {
                id: row.category_id,
                name: row.category_name,
            },
            initiator: UserShort {
                id: row.initiator_id,
                name: row.initiator_name,
            },
            location: Location {
                id: row.location_id,
                lat: row.lat,
                lon: row.lon,
            },
            event_date: row.event_date,
            created_on: row.created_on,
            published_on: row.published_on,
            paid: row.paid,
            participant_limit: row.participant_limit,
            request_moderation: row.request_moderation,
            state,
            confirmed_requests: row.confirmed_requests,
            views: 0,
        })
    }
}

/// A row of the `requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestRow {
    /// Primary key.
    pub id: i64,
    /// Event id.
    pub event_id: i64,
    /// Requester id.
    pub requester_id: i64,
    /// Creation time.
    pub created: NaiveDateTime,
    /// Status as text.
    pub status: String,
}

impl TryFrom<RequestRow> for ParticipationRequest {
    type Error = ServiceError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| ServiceError::Persistence(format!("corrupt request status: {}", row.status)))?;
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            requester_id: row.requester_id,
            created: row.created,
            status,
        })
    }
}

/// A comment joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    /// Primary key.
    pub id: i64,
    /// Body.
    pub text: String,
    /// Event id.
    pub event_id: i64,
    /// Creation time.
    pub created: NaiveDateTime,
    /// Status as text.
    pub status: String,
    /// Joined author id.
    pub commentator_id: i64,
    /// Joined author name.
    pub commentator_name: String,
}

impl TryFrom<CommentRow> for Comment {
    type Error = ServiceError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| ServiceError::Persistence(format!("corrupt comment status: {}", row.status)))?;
        Ok(Self {
            id: row.id,
            text: row.text,
            commentator: UserShort {
                id: row.commentator_id,
                name: row.commentator_name,
            },
            event_id: row.event_id,
            created: row.created,
            status,
        })
    }
}

/// A row of the `compilations` table.
#[derive(Debug, Clone, FromRow)]
pub struct CompilationRow {
    /// Primary key.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Pinned flag.
    pub pinned: bool,
}

/// A row of the `hits` table.
#[derive(Debug, Clone, FromRow)]
pub struct HitRow {
    /// Primary key.
    pub id: i64,
    /// Reporting service.
    pub app: String,
    /// URI.
    pub uri: String,
    /// Client address.
    pub ip: String,
    /// Hit time.
    pub timestamp: NaiveDateTime,
}

impl From<HitRow> for EndpointHit {
    fn from(row: HitRow) -> Self {
        Self {
            id: row.id,
            app: row.app,
            uri: row.uri,
            ip: row.ip,
            timestamp: row.timestamp,
        }
    }
}

/// One aggregated stats row.
#[derive(Debug, Clone, FromRow)]
pub struct ViewStatsRow {
    /// Reporting service.
    pub app: String,
    /// URI.
    pub uri: String,
    /// Hit count.
    pub hits: i64,
}

impl From<ViewStatsRow> for ViewStats {
    fn from(row: ViewStatsRow) -> Self {
        Self {
            app: row.app,
            uri: row.uri,
            hits: row.hits,
        }
    }
}

//! Event DTOs: creation, owner and admin updates, full and short views.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{CategoryDto, UserShortDto, not_blank};
use crate::domain::{
    AdminStateAction, Coordinates, Event, EventPatch, EventState, Location, NewEvent,
    OwnerStateAction, time,
};

fn default_true() -> bool {
    true
}

/// Venue position. Coordinates are stored as given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    /// Latitude in degrees.
    #[schema(example = 55.754167)]
    pub lat: f64,
    /// Longitude in degrees.
    #[schema(example = 37.62)]
    pub lon: f64,
}

impl From<LocationDto> for Coordinates {
    fn from(dto: LocationDto) -> Self {
        Self {
            lat: dto.lat,
            lon: dto.lon,
        }
    }
}

impl From<Location> for LocationDto {
    fn from(location: Location) -> Self {
        Self {
            lat: location.lat,
            lon: location.lon,
        }
    }
}

/// Body of `POST /users/{user_id}/events`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEventDto {
    /// Short summary, 20..2000 chars.
    #[validate(length(min = 20, max = 2000), custom(function = "not_blank"))]
    pub annotation: String,
    /// Category id.
    pub category: i64,
    /// Full description, 20..7000 chars.
    #[validate(length(min = 20, max = 7000), custom(function = "not_blank"))]
    pub description: String,
    /// When the event takes place; at least two hours ahead.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-12-31 15:10:05")]
    pub event_date: NaiveDateTime,
    /// Venue.
    pub location: LocationDto,
    /// Paid flag. Defaults to `false`.
    #[serde(default)]
    pub paid: bool,
    /// Participant limit, `0` = unlimited. Defaults to `0`.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub participant_limit: i64,
    /// Whether requests need confirmation. Defaults to `true`.
    #[serde(default = "default_true")]
    pub request_moderation: bool,
    /// Title, 3..120 chars.
    #[validate(length(min = 3, max = 120), custom(function = "not_blank"))]
    pub title: String,
}

impl From<NewEventDto> for NewEvent {
    fn from(dto: NewEventDto) -> Self {
        Self {
            title: dto.title,
            annotation: dto.annotation,
            description: dto.description,
            category_id: dto.category,
            location: dto.location.into(),
            event_date: dto.event_date,
            paid: dto.paid,
            participant_limit: dto.participant_limit,
            request_moderation: dto.request_moderation,
        }
    }
}

/// Body of `PATCH /users/{user_id}/events/{event_id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventUserRequest {
    /// New summary, 20..2000 chars.
    #[validate(length(min = 20, max = 2000), custom(function = "not_blank"))]
    pub annotation: Option<String>,
    /// New category id.
    pub category: Option<i64>,
    /// New description, 20..7000 chars.
    #[validate(length(min = 20, max = 7000), custom(function = "not_blank"))]
    pub description: Option<String>,
    /// New date; at least two hours ahead.
    #[serde(default, with = "time::wire_option")]
    #[schema(value_type = Option<String>, example = "2024-12-31 15:10:05")]
    pub event_date: Option<NaiveDateTime>,
    /// New venue.
    pub location: Option<LocationDto>,
    /// New paid flag.
    pub paid: Option<bool>,
    /// New participant limit.
    #[validate(range(min = 0))]
    pub participant_limit: Option<i64>,
    /// New moderation flag.
    pub request_moderation: Option<bool>,
    /// Send to review or withdraw.
    pub state_action: Option<OwnerStateAction>,
    /// New title, 3..120 chars.
    #[validate(length(min = 3, max = 120), custom(function = "not_blank"))]
    pub title: Option<String>,
}

impl From<UpdateEventUserRequest> for EventPatch<OwnerStateAction> {
    fn from(dto: UpdateEventUserRequest) -> Self {
        Self {
            title: dto.title,
            annotation: dto.annotation,
            description: dto.description,
            category_id: dto.category,
            location: dto.location.map(Coordinates::from),
            event_date: dto.event_date,
            paid: dto.paid,
            participant_limit: dto.participant_limit,
            request_moderation: dto.request_moderation,
            state_action: dto.state_action,
        }
    }
}

/// Body of `PATCH /admin/events/{event_id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventAdminRequest {
    /// New summary, 20..2000 chars.
    #[validate(length(min = 20, max = 2000), custom(function = "not_blank"))]
    pub annotation: Option<String>,
    /// New category id.
    pub category: Option<i64>,
    /// New description, 20..7000 chars.
    #[validate(length(min = 20, max = 7000), custom(function = "not_blank"))]
    pub description: Option<String>,
    /// New date; at least two hours ahead.
    #[serde(default, with = "time::wire_option")]
    #[schema(value_type = Option<String>, example = "2024-12-31 15:10:05")]
    pub event_date: Option<NaiveDateTime>,
    /// New venue.
    pub location: Option<LocationDto>,
    /// New paid flag.
    pub paid: Option<bool>,
    /// New participant limit.
    #[validate(range(min = 0))]
    pub participant_limit: Option<i64>,
    /// New moderation flag.
    pub request_moderation: Option<bool>,
    /// Publish or reject.
    pub state_action: Option<AdminStateAction>,
    /// New title, 3..120 chars.
    #[validate(length(min = 3, max = 120), custom(function = "not_blank"))]
    pub title: Option<String>,
}

impl From<UpdateEventAdminRequest> for EventPatch<AdminStateAction> {
    fn from(dto: UpdateEventAdminRequest) -> Self {
        Self {
            title: dto.title,
            annotation: dto.annotation,
            description: dto.description,
            category_id: dto.category,
            location: dto.location.map(Coordinates::from),
            event_date: dto.event_date,
            paid: dto.paid,
            participant_limit: dto.participant_limit,
            request_moderation: dto.request_moderation,
            state_action: dto.state_action,
        }
    }
}

/// Full view of an event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventFullDto {
    /// Event id.
    pub id: i64,
    /// Summary.
    pub annotation: String,
    /// Category.
    pub category: CategoryDto,
    /// Number of confirmed participants.
    pub confirmed_requests: i64,
    /// Creation time.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-06-01 10:00:00")]
    pub created_on: NaiveDateTime,
    /// Description.
    pub description: String,
    /// Event date.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-12-31 15:10:05")]
    pub event_date: NaiveDateTime,
    /// Creator.
    pub initiator: UserShortDto,
    /// Venue.
    pub location: LocationDto,
    /// Paid flag.
    pub paid: bool,
    /// Participant limit, `0` = unlimited.
    pub participant_limit: i64,
    /// Publication time; `null` until published.
    #[serde(with = "time::wire_option")]
    #[schema(value_type = Option<String>, example = "2024-06-02 10:00:00")]
    pub published_on: Option<NaiveDateTime>,
    /// Whether requests need confirmation.
    pub request_moderation: bool,
    /// Lifecycle state.
    pub state: EventState,
    /// Title.
    pub title: String,
    /// Unique public views.
    pub views: i64,
}

impl From<Event> for EventFullDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            annotation: event.annotation,
            category: event.category.into(),
            confirmed_requests: event.confirmed_requests,
            created_on: event.created_on,
            description: event.description,
            event_date: event.event_date,
            initiator: event.initiator.into(),
            location: event.location.into(),
            paid: event.paid,
            participant_limit: event.participant_limit,
            published_on: event.published_on,
            request_moderation: event.request_moderation,
            state: event.state,
            title: event.title,
            views: event.views,
        }
    }
}

/// Short view of an event used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventShortDto {
    /// Event id.
    pub id: i64,
    /// Summary.
    pub annotation: String,
    /// Category.
    pub category: CategoryDto,
    /// Number of confirmed participants.
    pub confirmed_requests: i64,
    /// Event date.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-12-31 15:10:05")]
    pub event_date: NaiveDateTime,
    /// Creator.
    pub initiator: UserShortDto,
    /// Paid flag.
    pub paid: bool,
    /// Title.
    pub title: String,
    /// Unique public views.
    pub views: i64,
}

impl From<Event> for EventShortDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            annotation: event.annotation,
            category: event.category.into(),
            confirmed_requests: event.confirmed_requests,
            event_date: event.event_date,
            initiator: event.initiator.into(),
            paid: event.paid,
            title: event.title,
            views: event.views,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_event_defaults() {
        let raw = r#"{
            "annotation": "An evening of live jazz by the river",
            "category": 1,
            "description": "Three bands, one stage and a lot of improvisation",
            "eventDate": "2024-06-10 19:00:00",
            "location": {"lat": 55.75, "lon": 37.61},
            "title": "Jazz night"
        }"#;
        let Ok(dto) = serde_json::from_str::<NewEventDto>(raw) else {
            panic!("valid body");
        };
        assert!(dto.validate().is_ok());
        assert!(!dto.paid);
        assert_eq!(dto.participant_limit, 0);
        assert!(dto.request_moderation);
    }

    #[test]
    fn out_of_range_coordinates_are_accepted() {
        let raw = r#"{
            "annotation": "An evening of live jazz by the river",
            "category": 1,
            "description": "Three bands, one stage and a lot of improvisation",
            "eventDate": "2024-06-10 19:00:00",
            "location": {"lat": 123.5, "lon": -200.0},
            "title": "Jazz night"
        }"#;
        let Ok(dto) = serde_json::from_str::<NewEventDto>(raw) else {
            panic!("valid body");
        };
        assert!(dto.validate().is_ok());
        let coordinates = Coordinates::from(dto.location);
        assert!((coordinates.lat - 123.5).abs() < f64::EPSILON);
        assert!((coordinates.lon + 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_annotation_is_rejected() {
        let dto = UpdateEventUserRequest {
            annotation: Some("too short".to_string()),
            ..UpdateEventUserRequest::default()
        };
        let Err(errors) = dto.validate() else {
            panic!("annotation below 20 chars must fail");
        };
        assert!(errors.field_errors().contains_key("annotation"));
    }

    #[test]
    fn state_action_uses_wire_names() {
        let Ok(dto) =
            serde_json::from_str::<UpdateEventAdminRequest>(r#"{"stateAction":"PUBLISH_EVENT"}"#)
        else {
            panic!("valid body");
        };
        assert_eq!(dto.state_action, Some(AdminStateAction::PublishEvent));
    }
}

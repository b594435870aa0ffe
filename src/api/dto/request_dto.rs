//! Participation request DTOs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{ParticipationRequest, RequestStatus, StatusUpdate, StatusUpdateOutcome, time};

/// A participation request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRequestDto {
    /// Request id.
    pub id: i64,
    /// Creation time.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-06-01 10:00:00")]
    pub created: NaiveDateTime,
    /// Event id.
    pub event: i64,
    /// Requesting user id.
    pub requester: i64,
    /// Current status.
    pub status: RequestStatus,
}

impl From<ParticipationRequest> for ParticipationRequestDto {
    fn from(request: ParticipationRequest) -> Self {
        Self {
            id: request.id,
            created: request.created,
            event: request.event_id,
            requester: request.requester_id,
            status: request.status,
        }
    }
}

/// Body of `PATCH /users/{user_id}/events/{event_id}/requests`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestStatusUpdateRequest {
    /// Requests to change.
    #[validate(length(min = 1))]
    pub request_ids: Vec<i64>,
    /// Target status.
    pub status: StatusUpdate,
}

/// Outcome of a bulk status change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestStatusUpdateResult {
    /// Requests confirmed by this change.
    pub confirmed_requests: Vec<ParticipationRequestDto>,
    /// Requests rejected by this change.
    pub rejected_requests: Vec<ParticipationRequestDto>,
}

impl From<StatusUpdateOutcome> for EventRequestStatusUpdateResult {
    fn from(outcome: StatusUpdateOutcome) -> Self {
        Self {
            confirmed_requests: outcome.confirmed.into_iter().map(Into::into).collect(),
            rejected_requests: outcome.rejected.into_iter().map(Into::into).collect(),
        }
    }
}

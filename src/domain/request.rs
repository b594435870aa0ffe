//! Participation requests and the capacity rules coupling them to events.
//!
//! The functions here never touch storage. Stores call them while holding
//! the parent event's row lock, so the confirmed counter they maintain stays
//! equal to the number of CONFIRMED requests.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::event::{Event, EventState};
use crate::error::ServiceError;

/// Status of a participation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Awaiting the initiator's decision.
    Pending,
    /// Holds a slot.
    Confirmed,
    /// Declined by the initiator or by capacity.
    Rejected,
    /// Withdrawn by the requester.
    Canceled,
}

impl RequestStatus {
    /// Stored and wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(ServiceError::BadRequest(format!("unknown request status: {other}"))),
        }
    }
}

/// Target of a bulk status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusUpdate {
    /// Confirm while slots remain, reject the rest.
    Confirmed,
    /// Reject every listed request.
    Rejected,
}

/// A user's request to take part in an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipationRequest {
    /// Store-assigned id.
    pub id: i64,
    /// Event applied to.
    pub event_id: i64,
    /// Applying user.
    pub requester_id: i64,
    /// Creation time.
    pub created: NaiveDateTime,
    /// Current status.
    pub status: RequestStatus,
}

/// Outcome of a bulk status change, each list sorted by request id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdateOutcome {
    /// Requests confirmed by this change.
    pub confirmed: Vec<ParticipationRequest>,
    /// Requests rejected by this change.
    pub rejected: Vec<ParticipationRequest>,
}

/// Decides the initial status of a new request for `event`.
///
/// Rules are checked in order: duplicate, own event, unpublished event,
/// capacity. A request is confirmed immediately when the event needs no
/// moderation or has no limit.
///
/// # Errors
///
/// Returns [`ServiceError::RequestConflict`] when any rule forbids the request.
pub fn admission(
    event: &Event,
    requester_id: i64,
    already_requested: bool,
) -> Result<RequestStatus, ServiceError> {
    if already_requested {
        return Err(ServiceError::RequestConflict(format!(
            "User id={requester_id} has already requested participation in event id={}",
            event.id
        )));
    }
    if event.initiator.id == requester_id {
        return Err(ServiceError::RequestConflict(
            "The initiator cannot request participation in their own event".to_string(),
        ));
    }
    if event.state != EventState::Published {
        return Err(ServiceError::RequestConflict(format!(
            "Cannot participate in an unpublished event id={}",
            event.id
        )));
    }
    if event.is_full() {
        return Err(ServiceError::RequestConflict(format!(
            "The participant limit of event id={} has been reached",
            event.id
        )));
    }
    if !event.request_moderation || event.participant_limit == 0 {
        Ok(RequestStatus::Confirmed)
    } else {
        Ok(RequestStatus::Pending)
    }
}

/// Applies a bulk status change to `requests` of `event`.
///
/// `requests` must hold every request of the event whose id is in
/// `requested_ids`; ids not present are reported as not found. The change is
/// fail-fast: the first request that is not PENDING aborts the whole batch,
/// and the caller discards every mutation made so far.
///
/// # Errors
///
/// - [`ServiceError::Validation`] if the event needs no confirmation, its
///   limit is already reached, or a listed request is not PENDING.
/// - [`ServiceError::NotFound`] if a listed request does not belong to the event.
pub fn apply_status_update(
    event: &mut Event,
    requests: &mut [ParticipationRequest],
    requested_ids: &[i64],
    target: StatusUpdate,
) -> Result<StatusUpdateOutcome, ServiceError> {
    if event.participant_limit == 0 || !event.request_moderation {
        return Err(ServiceError::Validation(
            "Confirmation of requests is not required for this event".to_string(),
        ));
    }
    if event.confirmed_requests >= event.participant_limit {
        return Err(ServiceError::Validation(
            "The participant limit has been reached".to_string(),
        ));
    }

    let mut outcome = StatusUpdateOutcome::default();
    let mut seen = HashSet::new();
    for &id in requested_ids {
        if !seen.insert(id) {
            continue;
        }
        let request = requests.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Request with id={id} was not found for event id={}",
                event.id
            ))
        })?;
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Validation(format!(
                "Request id={id} must have status PENDING, but is {}",
                request.status
            )));
        }
        match target {
            StatusUpdate::Confirmed if event.confirmed_requests < event.participant_limit => {
                request.status = RequestStatus::Confirmed;
                event.confirmed_requests += 1;
                outcome.confirmed.push(request.clone());
            }
            StatusUpdate::Confirmed | StatusUpdate::Rejected => {
                request.status = RequestStatus::Rejected;
                outcome.rejected.push(request.clone());
            }
        }
    }
    outcome.confirmed.sort_by_key(|r| r.id);
    outcome.rejected.sort_by_key(|r| r.id);
    Ok(outcome)
}

/// Cancels `request` on behalf of `requester_id`.
///
/// Returns `true` when the request held a slot that must be released.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthorized`] if `requester_id` did not file it.
pub fn cancel(request: &mut ParticipationRequest, requester_id: i64) -> Result<bool, ServiceError> {
    if request.requester_id != requester_id {
        return Err(ServiceError::Unauthorized(format!(
            "User id={requester_id} is not the requester of request id={}",
            request.id
        )));
    }
    let held_slot = request.status == RequestStatus::Confirmed;
    request.status = RequestStatus::Canceled;
    Ok(held_slot)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::tests::{at, sample_event};

    fn published(limit: i64, moderation: bool) -> Event {
        Event {
            state: EventState::Published,
            participant_limit: limit,
            request_moderation: moderation,
            ..sample_event()
        }
    }

    fn pending_request(id: i64) -> ParticipationRequest {
        ParticipationRequest {
            id,
            event_id: 1,
            requester_id: 100 + id,
            created: at("2024-06-02 10:00:00"),
            status: RequestStatus::Pending,
        }
    }

    #[test]
    fn duplicate_is_checked_first() {
        let mut event = published(1, true);
        event.state = EventState::Pending;
        let Err(ServiceError::RequestConflict(msg)) = admission(&event, 10, true) else {
            panic!("duplicate must conflict");
        };
        assert!(msg.contains("already"));
    }

    #[test]
    fn initiator_cannot_join() {
        let event = published(0, true);
        assert!(matches!(admission(&event, 10, false), Err(ServiceError::RequestConflict(_))));
    }

    #[test]
    fn unpublished_event_rejects_requests() {
        let event = Event {
            state: EventState::Pending,
            ..published(0, true)
        };
        assert!(matches!(admission(&event, 11, false), Err(ServiceError::RequestConflict(_))));
    }

    #[test]
    fn full_event_rejects_requests() {
        let event = Event {
            confirmed_requests: 2,
            ..published(2, true)
        };
        assert!(matches!(admission(&event, 11, false), Err(ServiceError::RequestConflict(_))));
    }

    #[test]
    fn unlimited_or_unmoderated_auto_confirms() {
        assert_eq!(admission(&published(0, true), 11, false), Ok(RequestStatus::Confirmed));
        assert_eq!(admission(&published(5, false), 11, false), Ok(RequestStatus::Confirmed));
        assert_eq!(admission(&published(5, true), 11, false), Ok(RequestStatus::Pending));
    }

    #[test]
    fn confirm_beyond_limit_rejects_remainder() {
        let mut event = published(2, true);
        let mut requests = vec![pending_request(1), pending_request(2), pending_request(3)];
        let Ok(outcome) = apply_status_update(&mut event, &mut requests, &[3, 1, 2], StatusUpdate::Confirmed)
        else {
            panic!("bulk confirm");
        };
        assert_eq!(event.confirmed_requests, 2);
        let confirmed: Vec<i64> = outcome.confirmed.iter().map(|r| r.id).collect();
        let rejected: Vec<i64> = outcome.rejected.iter().map(|r| r.id).collect();
        assert_eq!(confirmed, vec![1, 3]);
        assert_eq!(rejected, vec![2]);
    }

    #[test]
    fn non_pending_aborts_batch() {
        let mut event = published(5, true);
        let mut requests = vec![pending_request(1), pending_request(2)];
        if let Some(second) = requests.get_mut(1) {
            second.status = RequestStatus::Confirmed;
        }
        let result = apply_status_update(&mut event, &mut requests, &[1, 2], StatusUpdate::Rejected);
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn bulk_requires_moderated_limited_event() {
        let mut unlimited = published(0, true);
        let mut requests = vec![pending_request(1)];
        assert!(matches!(
            apply_status_update(&mut unlimited, &mut requests, &[1], StatusUpdate::Confirmed),
            Err(ServiceError::Validation(_))
        ));
        let mut full = Event {
            confirmed_requests: 1,
            ..published(1, true)
        };
        assert!(matches!(
            apply_status_update(&mut full, &mut requests, &[1], StatusUpdate::Rejected),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let mut event = published(5, true);
        let mut requests = vec![pending_request(1)];
        assert!(matches!(
            apply_status_update(&mut event, &mut requests, &[1, 9], StatusUpdate::Confirmed),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn cancel_reports_released_slot() {
        let mut request = pending_request(1);
        request.status = RequestStatus::Confirmed;
        assert_eq!(cancel(&mut request, 101), Ok(true));
        assert_eq!(request.status, RequestStatus::Canceled);
        assert!(matches!(cancel(&mut request, 5), Err(ServiceError::Unauthorized(_))));
    }
}

//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the single error type raised by the domain, the
//! persistence layer and the services. Each variant maps to an HTTP status
//! code and a short reason, and is rendered once at the HTTP boundary as an
//! [`ApiError`] body:
//!
//! ```json
//! {
//!   "status": "CONFLICT",
//!   "reason": "state conflict",
//!   "message": "Cannot publish the event because it's not in the right state: CANCELED",
//!   "timestamp": "2024-06-01 10:00:00"
//! }
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::time;

/// Structured JSON error body returned for every 4xx/5xx response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// Upper-snake HTTP reason phrase, e.g. `"NOT_FOUND"`.
    pub status: String,
    /// Short, stable description of the error kind.
    pub reason: String,
    /// Human-readable detail.
    pub message: String,
    /// Moment the error was produced, `yyyy-MM-dd HH:mm:ss`.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-06-01 10:00:00")]
    pub timestamp: NaiveDateTime,
}

/// Error taxonomy shared by both services.
///
/// | Variant                | HTTP | Reason                    |
/// |------------------------|------|---------------------------|
/// | `NotFound`             | 404  | object not found          |
/// | `BadRequest`           | 400  | request malformed         |
/// | `BadTime`              | 400  | bad date/time             |
/// | `Unauthorized`         | 401  | not authorized            |
/// | `IntegrityViolation`   | 409  | integrity constraint      |
/// | `StateConflict`        | 409  | state conflict            |
/// | `RequestConflict`      | 409  | participation forbidden   |
/// | `Validation`           | 409  | validation                |
/// | `Persistence`          | 500  | persistence failure       |
/// | `Internal`             | 500  | internal error            |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Referenced entity does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),

    /// Malformed or missing parameter.
    #[error("{0}")]
    BadRequest(String),

    /// A date/time rule was violated.
    #[error("{0}")]
    BadTime(String),

    /// Caller does not own the resource.
    #[error("{0}")]
    Unauthorized(String),

    /// Uniqueness or referential constraint would be broken.
    #[error("{0}")]
    IntegrityViolation(String),

    /// Current event or comment state forbids the operation.
    #[error("{0}")]
    StateConflict(String),

    /// A participation rule forbids the request.
    #[error("{0}")]
    RequestConflict(String),

    /// Business rule on a batch status change was violated.
    #[error("{0}")]
    Validation(String),

    /// Database failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Shorthand for a [`ServiceError::NotFound`] naming the entity and id.
    #[must_use]
    pub fn not_found(entity: &str, id: i64) -> Self {
        Self::NotFound(format!("{entity} with id={id} was not found"))
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::BadTime(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::IntegrityViolation(_)
            | Self::StateConflict(_)
            | Self::RequestConflict(_)
            | Self::Validation(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short reason string for this variant.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "object not found",
            Self::BadRequest(_) => "request malformed",
            Self::BadTime(_) => "bad date/time",
            Self::Unauthorized(_) => "not authorized",
            Self::IntegrityViolation(_) => "integrity constraint",
            Self::StateConflict(_) => "state conflict",
            Self::RequestConflict(_) => "participation forbidden",
            Self::Validation(_) => "validation",
            Self::Persistence(_) => "persistence failure",
            Self::Internal(_) => "internal error",
        }
    }

    /// Builds the JSON body for this error, stamped with `timestamp`.
    #[must_use]
    pub fn to_api_error(&self, timestamp: NaiveDateTime) -> ApiError {
        ApiError {
            status: status_name(self.status_code()),
            reason: self.reason().to_string(),
            message: self.to_string(),
            timestamp,
        }
    }
}

/// `404 Not Found` → `"NOT_FOUND"`.
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_ascii_uppercase()
        .replace(' ', "_")
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = self.to_api_error(time::local_now());
        (status, axum::Json(body)).into_response()
    }
}

// ── Conversions ──

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation, foreign_key_violation
                Some("23505") | Some("23503") => Self::IntegrityViolation(db.message().to_string()),
                _ => Self::Persistence(err.to_string()),
            },
            _ => Self::Persistence(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ServiceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_validation_errors(&errors, "", &mut fields);
        fields.sort();
        Self::BadRequest(format!("validation failed: {}", fields.join("; ")))
    }
}

/// Flattens `errors` into `path: code, ...` entries, descending into nested
/// structs (`location.lat`) and lists (`events[0].id`).
fn collect_validation_errors(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                out.push(format!("{prefix}{field}: {}", codes.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(nested, &format!("{prefix}{field}."), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(nested, &format!("{prefix}{field}[{index}]."), out);
                }
            }
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses_and_reasons() {
        let cases = [
            (ServiceError::NotFound(String::new()), 404, "object not found"),
            (ServiceError::BadRequest(String::new()), 400, "request malformed"),
            (ServiceError::BadTime(String::new()), 400, "bad date/time"),
            (ServiceError::Unauthorized(String::new()), 401, "not authorized"),
            (ServiceError::IntegrityViolation(String::new()), 409, "integrity constraint"),
            (ServiceError::StateConflict(String::new()), 409, "state conflict"),
            (ServiceError::RequestConflict(String::new()), 409, "participation forbidden"),
            (ServiceError::Validation(String::new()), 409, "validation"),
        ];
        for (err, status, reason) in cases {
            assert_eq!(err.status_code().as_u16(), status);
            assert_eq!(err.reason(), reason);
        }
    }

    #[test]
    fn api_error_uses_upper_snake_status() {
        let Some(ts) = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).and_then(|d| d.and_hms_opt(10, 0, 0))
        else {
            panic!("valid timestamp");
        };
        let body = ServiceError::not_found("Event", 7).to_api_error(ts);
        assert_eq!(body.status, "NOT_FOUND");
        assert_eq!(body.message, "Event with id=7 was not found");

        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["timestamp"], "2024-06-01 10:00:00");
        assert_eq!(json["reason"], "object not found");
    }

    #[test]
    fn server_errors_render_internal_server_error() {
        let Some(ts) = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        else {
            panic!("valid timestamp");
        };
        let body = ServiceError::Persistence("boom".into()).to_api_error(ts);
        assert_eq!(body.status, "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn nested_validation_errors_keep_their_path() {
        use validator::Validate;

        #[derive(Validate)]
        struct Inner {
            #[validate(range(min = 1))]
            size: i64,
        }

        #[derive(Validate)]
        struct Outer {
            #[validate(length(min = 3))]
            name: String,
            #[validate(nested)]
            inner: Inner,
        }

        let outer = Outer {
            name: "ab".into(),
            inner: Inner { size: 0 },
        };
        let Err(errors) = outer.validate() else {
            panic!("both fields are invalid");
        };
        let ServiceError::BadRequest(message) = ServiceError::from(errors) else {
            panic!("validation errors are bad requests");
        };
        assert_eq!(message, "validation failed: inner.size: range; name: length");
    }

    #[test]
    fn row_not_found_is_not_found() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}

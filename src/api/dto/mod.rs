//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire and timestamps use the
//! `yyyy-MM-dd HH:mm:ss` format. Request bodies are checked with
//! `validator` before they reach a service.

pub mod category_dto;
pub mod comment_dto;
pub mod compilation_dto;
pub mod event_dto;
pub mod request_dto;
pub mod stats_dto;
pub mod user_dto;

pub use category_dto::*;
pub use comment_dto::*;
pub use compilation_dto::*;
pub use event_dto::*;
pub use request_dto::*;
pub use stats_dto::*;
pub use user_dto::*;

use validator::ValidationError;

/// Rejects strings made only of whitespace.
///
/// # Errors
///
/// Returns a `blank` validation error.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

//! Comment DTOs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{EventShortDto, UserShortDto, not_blank};
use crate::domain::{CommentStatus, time};
use crate::service::CommentView;

/// Body of `POST /users/{user_id}/comments/{event_id}`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCommentDto {
    /// Comment text, 5..1000 chars.
    #[validate(length(min = 5, max = 1000), custom(function = "not_blank"))]
    #[schema(example = "Great line-up, see you there!")]
    pub text: String,
}

/// Body of `PATCH /users/{user_id}/comments/{comment_id}`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentDto {
    /// Replacement text, 5..1000 chars.
    #[validate(length(min = 5, max = 1000), custom(function = "not_blank"))]
    pub text: String,
}

/// Body of `PATCH /admin/comments/{comment_id}`.
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusCommentAdmin {
    /// New moderation status.
    pub status: CommentStatus,
}

/// A comment with its event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentFullDto {
    /// Comment id.
    pub id: i64,
    /// Text.
    pub text: String,
    /// Author.
    pub commentator: UserShortDto,
    /// Commented event.
    pub event: EventShortDto,
    /// Creation time.
    #[serde(with = "time::wire")]
    #[schema(value_type = String, example = "2024-06-01 10:00:00")]
    pub created: NaiveDateTime,
    /// Moderation status.
    pub status: CommentStatus,
}

impl From<CommentView> for CommentFullDto {
    fn from(view: CommentView) -> Self {
        let CommentView { comment, event } = view;
        Self {
            id: comment.id,
            text: comment.text,
            commentator: comment.commentator.into(),
            event: event.into(),
            created: comment.created,
            status: comment.status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_text_is_rejected() {
        let dto = NewCommentDto {
            text: "      ".to_string(),
        };
        let Err(errors) = dto.validate() else {
            panic!("blank text must fail");
        };
        assert!(errors.field_errors().contains_key("text"));
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert!(serde_json::from_str::<UpdateStatusCommentAdmin>(r#"{"status":"HIDDEN"}"#).is_err());
    }
}

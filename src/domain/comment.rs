//! Comments on published events and their moderation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserShort;
use crate::error::ServiceError;

/// Moderation status of a comment. Only PUBLISHED comments are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    /// Awaiting moderation.
    Pending,
    /// Visible to everyone.
    Published,
    /// Declined by a moderator.
    Canceled,
}

impl CommentStatus {
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

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PUBLISHED" => Ok(Self::Published),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(ServiceError::BadRequest(format!("unknown comment status: {other}"))),
        }
    }
}

/// A comment with its author resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Store-assigned id.
    pub id: i64,
    /// Body, 5..1000 chars.
    pub text: String,
    /// Author.
    pub commentator: UserShort,
    /// Commented event.
    pub event_id: i64,
    /// Creation time.
    pub created: NaiveDateTime,
    /// Moderation status.
    pub status: CommentStatus,
}

/// Everything needed to insert a comment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    /// Body.
    pub text: String,
    /// Author id.
    pub commentator_id: i64,
    /// Commented event id.
    pub event_id: i64,
    /// Creation time.
    pub created: NaiveDateTime,
}

impl Comment {
    /// Replaces the text on behalf of `user_id`. A declined comment is
    /// resubmitted for moderation.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Unauthorized`] if `user_id` is not the author.
    /// - [`ServiceError::StateConflict`] if the comment is already published.
    pub fn edit(&mut self, user_id: i64, text: &str) -> Result<(), ServiceError> {
        self.ensure_author(user_id)?;
        if self.status == CommentStatus::Published {
            return Err(ServiceError::StateConflict(
                "A published comment cannot be changed".to_string(),
            ));
        }
        text.clone_into(&mut self.text);
        self.status = CommentStatus::Pending;
        Ok(())
    }

    /// Moves a pending comment to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StateConflict`] unless the comment is PENDING
    /// and `status` is PUBLISHED or CANCELED.
    pub fn moderate(&mut self, status: CommentStatus) -> Result<(), ServiceError> {
        if self.status != CommentStatus::Pending {
            return Err(ServiceError::StateConflict(format!(
                "Only pending comments can be moderated, comment id={} is {}",
                self.id, self.status
            )));
        }
        if status == CommentStatus::Pending {
            return Err(ServiceError::StateConflict(
                "A comment can only be moved to PUBLISHED or CANCELED".to_string(),
            ));
        }
        self.status = status;
        Ok(())
    }

    /// Checks that `user_id` wrote this comment.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] otherwise.
    pub fn ensure_author(&self, user_id: i64) -> Result<(), ServiceError> {
        if self.commentator.id != user_id {
            return Err(ServiceError::Unauthorized(format!(
                "User id={user_id} is not the author of comment id={}",
                self.id
            )));
        }
        Ok(())
    }
}

//! User DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;
use crate::domain::{NewUser, User, UserShort};

/// Body of `POST /admin/users`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUserRequest {
    /// Display name, 2..250 chars.
    #[validate(length(min = 2, max = 250), custom(function = "not_blank"))]
    #[schema(example = "Alice Smith")]
    pub name: String,
    /// Unique e-mail, 6..254 chars.
    #[validate(email, length(min = 6, max = 254))]
    #[schema(example = "alice@example.com")]
    pub email: String,
}

impl From<NewUserRequest> for NewUser {
    fn from(dto: NewUserRequest) -> Self {
        Self {
            name: dto.name.trim().to_string(),
            email: dto.email,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// E-mail.
    pub email: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Public reference to a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShortDto {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
}

impl From<UserShort> for UserShortDto {
    fn from(user: UserShort) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

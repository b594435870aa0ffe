//! Category DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;
use crate::domain::Category;

/// Body of `POST /admin/categories` and `PATCH /admin/categories/{cat_id}`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCategoryDto {
    /// Unique name, 1..50 chars.
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    #[schema(example = "Concerts")]
    pub name: String,
}

/// A category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    /// Category id.
    pub id: i64,
    /// Name.
    pub name: String,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

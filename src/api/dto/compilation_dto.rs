//! Compilation DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{EventShortDto, not_blank};
use crate::domain::{CompilationPatch, NewCompilation};
use crate::service::CompilationView;

/// Body of `POST /admin/compilations`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCompilationDto {
    /// Event ids; duplicates are collapsed.
    #[serde(default)]
    pub events: Vec<i64>,
    /// Shown on the front page. Defaults to `false`.
    #[serde(default)]
    pub pinned: bool,
    /// Title, 1..50 chars.
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    #[schema(example = "Summer concerts")]
    pub title: String,
}

impl From<NewCompilationDto> for NewCompilation {
    fn from(dto: NewCompilationDto) -> Self {
        Self {
            title: dto.title,
            pinned: dto.pinned,
            event_ids: dto.events,
        }
    }
}

/// Body of `PATCH /admin/compilations/{comp_id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompilationRequest {
    /// Replacement event ids.
    #[serde(default, alias = "eventIds")]
    pub events: Option<Vec<i64>>,
    /// New pinned flag.
    pub pinned: Option<bool>,
    /// New title, 1..50 chars.
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub title: Option<String>,
}

impl From<UpdateCompilationRequest> for CompilationPatch {
    fn from(dto: UpdateCompilationRequest) -> Self {
        Self {
            title: dto.title,
            pinned: dto.pinned,
            event_ids: dto.events,
        }
    }
}

/// A compilation with its events.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompilationDto {
    /// Compilation id.
    pub id: i64,
    /// Included events.
    pub events: Vec<EventShortDto>,
    /// Pinned flag.
    pub pinned: bool,
    /// Title.
    pub title: String,
}

impl From<CompilationView> for CompilationDto {
    fn from(view: CompilationView) -> Self {
        Self {
            id: view.compilation.id,
            events: view.events.into_iter().map(Into::into).collect(),
            pinned: view.compilation.pinned,
            title: view.compilation.title,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn update_accepts_event_ids_alias() {
        let Ok(dto) = serde_json::from_str::<UpdateCompilationRequest>(r#"{"eventIds":[3,1]}"#)
        else {
            panic!("valid body");
        };
        assert_eq!(dto.events, Some(vec![3, 1]));
        assert_eq!(dto.pinned, None);
    }
}

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::shared::{Pagination, required_text};
use crate::entity::tag;
use crate::error::AppError;

/// Request body for creating or renaming a tag.
#[derive(Deserialize, ToSchema)]
pub struct TagRequest {
    /// Unique tag name (1-50 characters, trimmed).
    #[schema(example = "music")]
    pub name: Option<String>,
}

/// Validate the request and return the trimmed name.
pub fn validate_tag_request(payload: &TagRequest) -> Result<String, AppError> {
    required_text("name", "Name", payload.name.as_deref(), Some(tag::NAME_MAX_LEN))
}

#[derive(Serialize, ToSchema, Clone, PartialEq, Eq, Debug)]
pub struct TagResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "music")]
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Tag detail, including how many videos reference it.
#[derive(Serialize, ToSchema)]
pub struct TagDetailResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "music")]
    pub name: String,
    /// Number of videos carrying this tag.
    #[schema(example = 12)]
    pub video_count: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    /// `name` (default) or `id`.
    pub sort_by: Option<String>,
    /// `asc` (default for tags) or `desc`.
    pub sort_order: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TagListResponse {
    pub data: Vec<TagResponse>,
    pub pagination: Pagination,
}

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum length of a video title, in characters.
pub const TITLE_MAX_LEN: usize = 100;
/// Maximum length of a video slug, in characters.
pub const SLUG_MAX_LEN: usize = 100;

/// Media directory receiving thumbnails.
pub const THUMBNAIL_DIR: &str = "thumbnails";
/// Media directory receiving video files.
pub const VIDEO_DIR: &str = "videos";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique, column_type = "String(StringLen::N(100))")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Media path under `thumbnails/`.
    #[sea_orm(column_type = "Text")]
    pub thumbnail: String,
    /// Media path under `videos/`.
    #[sea_orm(column_type = "Text")]
    pub video: String,

    #[sea_orm(unique, column_type = "String(StringLen::N(100))")]
    pub slug: String,

    // Maintained by the system, never by the admin form.
    pub published_at: Option<DateTimeUtc>,
    pub is_published: bool,
    #[sea_orm(default_value = 0)]
    pub num_likes: i32,
    #[sea_orm(default_value = 0)]
    pub num_views: i32,

    #[sea_orm(has_many, via = "video_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

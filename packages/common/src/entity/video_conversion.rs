use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ConversionStatus;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video_conversion")]
pub struct Model {
    /// One row per video; the video lives in the server's `video` table.
    #[sea_orm(primary_key, auto_increment = false)]
    pub video_id: i32,

    pub status: ConversionStatus,

    /// Directory the chunks were read from.
    pub source_path: String,

    /// Set once the conversion completed.
    pub manifest_path: Option<String>,

    pub queued_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

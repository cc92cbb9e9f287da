use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversion_error")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub video_id: i32,
    pub job_id: String,

    /// Short description of the failing step.
    pub message: String,

    /// Underlying error text (ffmpeg output, IO error, ...).
    #[sea_orm(column_type = "Text")]
    pub details: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use chrono::{DateTime, Utc};
use common::ConversionStatus;
use common::entity::{conversion_error, video_conversion};
use serde::Serialize;
use utoipa::ToSchema;

/// Response to a stored upload chunk.
#[derive(Serialize, ToSchema)]
pub struct ChunkResponse {
    #[schema(example = 1)]
    pub video_id: i32,
    #[schema(example = 0)]
    pub index: u32,
    /// Bytes written.
    #[schema(example = 1048576)]
    pub size: u64,
}

/// Response to a queued conversion.
#[derive(Serialize, ToSchema)]
pub struct ConvertResponse {
    #[schema(example = "0192d4c6-8d2e-7b1a-9f00-3b5c2f1e7a10")]
    pub job_id: String,
    #[schema(example = 1)]
    pub video_id: i32,
    pub status: ConversionStatus,
}

#[derive(Serialize, ToSchema)]
pub struct ConversionErrorResponse {
    pub id: i32,
    pub job_id: String,
    #[schema(example = "ffmpeg failed")]
    pub message: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl From<conversion_error::Model> for ConversionErrorResponse {
    fn from(model: conversion_error::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            message: model.message,
            details: model.details,
            created_at: model.created_at,
        }
    }
}

/// Conversion state of one video.
#[derive(Serialize, ToSchema)]
pub struct ConversionResponse {
    #[schema(example = 1)]
    pub video_id: i32,
    /// `None` if no conversion was ever queued.
    pub status: Option<ConversionStatus>,
    /// True once an MPEG-DASH manifest exists.
    pub processed: bool,
    pub queued_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    #[schema(example = "./media/uploads/1/mpeg-dash/output.mpd")]
    pub manifest_path: Option<String>,
    /// Recorded failures, newest first.
    pub errors: Vec<ConversionErrorResponse>,
}

impl ConversionResponse {
    pub fn new(
        video_id: i32,
        row: Option<video_conversion::Model>,
        errors: Vec<conversion_error::Model>,
    ) -> Self {
        let errors = errors.into_iter().map(Into::into).collect();
        match row {
            Some(row) => Self {
                video_id,
                status: Some(row.status),
                processed: row.status.is_processed(),
                queued_at: Some(row.queued_at),
                processed_at: row.processed_at,
                manifest_path: row.manifest_path,
                errors,
            },
            None => Self {
                video_id,
                status: None,
                processed: false,
                queued_at: None,
                processed_at: None,
                manifest_path: None,
                errors,
            },
        }
    }
}

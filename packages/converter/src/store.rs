//! Conversion bookkeeping in the shared `video_conversion` and
//! `conversion_error` tables.

use chrono::Utc;
use common::entity::{conversion_error, video_conversion};
use common::{ConversionJob, ConversionStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

/// Whether the video already has a completed conversion.
pub async fn is_processed<C: ConnectionTrait>(db: &C, video_id: i32) -> Result<bool, DbErr> {
    let row = video_conversion::Entity::find_by_id(video_id).one(db).await?;
    Ok(row.is_some_and(|r| r.status.is_processed()))
}

/// Record the state of a job, creating the row if the job did not come
/// through the API.
async fn upsert<C: ConnectionTrait>(
    db: &C,
    job: &ConversionJob,
    status: ConversionStatus,
    manifest_path: Option<String>,
) -> Result<(), DbErr> {
    let now = Utc::now();
    let finished = matches!(status, ConversionStatus::Completed | ConversionStatus::Failed);

    let mut update = vec![
        video_conversion::Column::Status,
        video_conversion::Column::SourcePath,
    ];
    if finished {
        update.push(video_conversion::Column::ManifestPath);
        update.push(video_conversion::Column::ProcessedAt);
    }

    video_conversion::Entity::insert(video_conversion::ActiveModel {
        video_id: Set(job.video_id),
        status: Set(status),
        source_path: Set(job.path.clone()),
        manifest_path: Set(manifest_path),
        queued_at: Set(now),
        processed_at: Set(finished.then_some(now)),
    })
    .on_conflict(
        OnConflict::column(video_conversion::Column::VideoId)
            .update_columns(update)
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    Ok(())
}

pub async fn mark_processing<C: ConnectionTrait>(db: &C, job: &ConversionJob) -> Result<(), DbErr> {
    upsert(db, job, ConversionStatus::Processing, None).await
}

pub async fn mark_completed<C: ConnectionTrait>(
    db: &C,
    job: &ConversionJob,
    manifest_path: String,
) -> Result<(), DbErr> {
    upsert(db, job, ConversionStatus::Completed, Some(manifest_path)).await
}

pub async fn mark_failed<C: ConnectionTrait>(db: &C, job: &ConversionJob) -> Result<(), DbErr> {
    upsert(db, job, ConversionStatus::Failed, None).await
}

pub async fn register_error<C: ConnectionTrait>(
    db: &C,
    job: &ConversionJob,
    message: &str,
    details: &str,
) -> Result<(), DbErr> {
    conversion_error::ActiveModel {
        video_id: Set(job.video_id),
        job_id: Set(job.job_id.clone()),
        message: Set(message.to_string()),
        details: Set(details.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

use std::path::Path as FsPath;

use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::conversion::{CHUNK_EXTENSION, chunk_dir, chunk_file_name};
use common::entity::{conversion_error, video_conversion};
use common::{ConversionJob, ConversionStatus};
use futures::StreamExt;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::video::find_video;
use crate::models::conversion::{ChunkResponse, ConversionResponse, ConvertResponse};
use crate::state::AppState;

pub fn chunk_body_limit(max_chunk_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_chunk_size).unwrap_or(usize::MAX))
}

#[utoipa::path(
    put,
    path = "/{id}/chunks/{index}",
    tag = "Conversion",
    operation_id = "uploadChunk",
    summary = "Upload a raw video chunk",
    description = "Stores the request body as chunk `index` of the video. Chunks are concatenated in index order when the conversion runs. Re-uploading an index replaces it. Requires `video:change` permission.",
    params(
        ("id" = i32, Path, description = "Video ID"),
        ("index" = u32, Path, description = "Chunk index"),
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Chunk stored", body = ChunkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Video already converted or conversion in progress (CONFLICT)", body = ErrorBody),
        (status = 413, description = "Chunk too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(id, index))]
pub async fn upload_chunk(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, index)): Path<(i32, u32)>,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("video:change")?;

    find_video(&state.db, id).await?;
    ensure_conversion_open(&state.db, id).await?;

    let dir = chunk_dir(FsPath::new(&state.config.storage.upload_root), id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create chunk directory: {e}")))?;

    // The partial file does not carry the chunk extension, so an interrupted
    // upload is never picked up by the merge.
    let final_path = dir.join(chunk_file_name(index));
    let part_path = dir.join(format!(".{index}.{CHUNK_EXTENSION}.part"));

    let written = match write_chunk(body, &part_path, state.config.storage.max_chunk_size).await {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }
    };
    tokio::fs::rename(&part_path, &final_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store chunk: {e}")))?;

    info!(size = written, "Chunk stored");
    Ok((
        StatusCode::CREATED,
        Json(ChunkResponse {
            video_id: id,
            index,
            size: written,
        }),
    ))
}

async fn write_chunk(body: Body, path: &FsPath, limit: u64) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create chunk file: {e}")))?;

    let mut stream = body.into_data_stream();
    let mut size = 0u64;
    while let Some(frame) = stream.next().await {
        let bytes = frame.map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
        size += bytes.len() as u64;
        if size > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Chunk exceeds maximum size of {limit} bytes"
            )));
        }
        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Chunk write failed: {e}")))?;
    }
    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Chunk flush failed: {e}")))?;

    if size == 0 {
        return Err(AppError::Validation("Chunk is empty".into()));
    }
    Ok(size)
}

#[utoipa::path(
    post,
    path = "/{id}/convert",
    tag = "Conversion",
    operation_id = "convertVideo",
    summary = "Queue the MPEG-DASH conversion of a video",
    description = "Publishes a conversion job for the uploaded chunks of the video. A converter merges them, runs ffmpeg and records the outcome. Requires `video:change` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 202, description = "Conversion queued", body = ConvertResponse),
        (status = 400, description = "No chunks uploaded (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Video already converted or conversion in progress (CONFLICT)", body = ErrorBody),
        (status = 503, description = "Message queue unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn convert_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("video:change")?;

    find_video(&state.db, id).await?;
    ensure_conversion_open(&state.db, id).await?;

    let dir = chunk_dir(FsPath::new(&state.config.storage.upload_root), id);
    if !has_chunks(&dir).await {
        return Err(AppError::Validation("No chunks uploaded for this video".into()));
    }

    let Some(queue) = state.mq.clone() else {
        return Err(AppError::ServiceUnavailable(
            "Conversion queue is not available".into(),
        ));
    };

    let source_path = dir.to_string_lossy().into_owned();
    let job = ConversionJob::new(id, source_path.clone());

    let queued = video_conversion::Entity::insert(video_conversion::ActiveModel {
        video_id: Set(id),
        status: Set(ConversionStatus::Queued),
        source_path: Set(source_path),
        manifest_path: Set(None),
        queued_at: Set(Utc::now()),
        processed_at: Set(None),
    })
    .on_conflict(
        OnConflict::column(video_conversion::Column::VideoId)
            .update_columns([
                video_conversion::Column::Status,
                video_conversion::Column::SourcePath,
                video_conversion::Column::ManifestPath,
                video_conversion::Column::QueuedAt,
                video_conversion::Column::ProcessedAt,
            ])
            // Only a failed attempt may be replaced.
            .action_and_where(
                Expr::col((video_conversion::Entity, video_conversion::Column::Status))
                    .eq(ConversionStatus::Failed.as_str()),
            )
            .to_owned(),
    )
    .exec_without_returning(&state.db)
    .await?;
    if queued == 0 {
        return Err(AppError::Conflict(
            "A conversion of this video is already in progress".into(),
        ));
    }

    if let Err(e) = mq::publish_conversion(&queue, &state.config.mq.queue_name, &job).await {
        error!(job_id = %job.job_id, error = %e, "Failed to publish conversion job");
        record_publish_failure(&state.db, &job, &e.to_string()).await?;
        return Err(AppError::ServiceUnavailable(
            "Failed to queue the conversion".into(),
        ));
    }

    info!(job_id = %job.job_id, "Conversion queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(ConvertResponse {
            job_id: job.job_id,
            video_id: id,
            status: ConversionStatus::Queued,
        }),
    ))
}

/// Reject work on a video that is converted or has a job queued or running.
async fn ensure_conversion_open<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    let Some(row) = video_conversion::Entity::find_by_id(id).one(db).await? else {
        return Ok(());
    };
    if row.status.is_processed() {
        return Err(AppError::Conflict("Video has already been converted".into()));
    }
    if row.status.is_in_flight() {
        return Err(AppError::Conflict(
            "A conversion of this video is already in progress".into(),
        ));
    }
    Ok(())
}

async fn has_chunks(dir: &FsPath) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let is_chunk = FsPath::new(&name)
            .extension()
            .is_some_and(|ext| ext == CHUNK_EXTENSION);
        if is_chunk && !name.to_string_lossy().starts_with('.') {
            return true;
        }
    }
    false
}

async fn record_publish_failure<C: ConnectionTrait>(
    db: &C,
    job: &ConversionJob,
    details: &str,
) -> Result<(), AppError> {
    video_conversion::Entity::update_many()
        .col_expr(
            video_conversion::Column::Status,
            Expr::value(ConversionStatus::Failed.as_str()),
        )
        .filter(video_conversion::Column::VideoId.eq(job.video_id))
        .exec(db)
        .await?;
    conversion_error::ActiveModel {
        video_id: Set(job.video_id),
        job_id: Set(job.job_id.clone()),
        message: Set("Failed to publish conversion job".into()),
        details: Set(details.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/{id}/conversion",
    tag = "Conversion",
    operation_id = "getConversion",
    summary = "Get the conversion state of a video",
    description = "Returns the conversion status, the manifest location once processed, and the recorded conversion errors (newest first). Requires `video:view` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Conversion state", body = ConversionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_conversion(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ConversionResponse>, AppError> {
    auth_user.require_permission("video:view")?;

    find_video(&state.db, id).await?;

    let row = video_conversion::Entity::find_by_id(id).one(&state.db).await?;
    let errors = conversion_error::Entity::find()
        .filter(conversion_error::Column::VideoId.eq(id))
        .order_by_desc(conversion_error::Column::CreatedAt)
        .order_by_desc(conversion_error::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(ConversionResponse::new(id, row, errors)))
}

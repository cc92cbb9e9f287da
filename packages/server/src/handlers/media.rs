use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::MediaStore;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::video::find_video;
use crate::state::AppState;
use crate::utils::filename::{base_name, content_disposition_value};

#[utoipa::path(
    get,
    path = "/{id}/thumbnail",
    tag = "Videos",
    operation_id = "downloadThumbnail",
    summary = "Download the thumbnail of a video",
    description = "Streams the stored thumbnail image. Supports `If-None-Match` revalidation. Requires `video:view` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Thumbnail content"),
        (status = 304, description = "Not modified"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(id))]
pub async fn download_thumbnail(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth_user.require_permission("video:view")?;

    let video = find_video(&state.db, id).await?;
    media_response(&*state.media, &video.thumbnail, &headers).await
}

#[utoipa::path(
    get,
    path = "/{id}/file",
    tag = "Videos",
    operation_id = "downloadVideoFile",
    summary = "Download the video file",
    description = "Streams the stored video file. Supports `If-None-Match` revalidation. Requires `video:view` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video content"),
        (status = 304, description = "Not modified"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(id))]
pub async fn download_video_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    auth_user.require_permission("video:view")?;

    let video = find_video(&state.db, id).await?;
    media_response(&*state.media, &video.video, &headers).await
}

/// Build a streaming response for a stored media file.
async fn media_response(
    media: &dyn MediaStore,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let meta = media.metadata(path).await?;
    let etag_value = meta.etag();
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = media.get_stream(path).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, meta.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(base_name(path)),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

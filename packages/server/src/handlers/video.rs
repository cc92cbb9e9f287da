use std::path::PathBuf;

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::entity::{conversion_error, video_conversion};
use common::storage::{BoxReader, MediaStore, StoredFile};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType, Query as SeaQuery};
use sea_orm::*;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::{tag, video, video_tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::{Pagination, escape_like, page_bounds, page_offset, sort_order};
use crate::models::tag::TagResponse;
use crate::models::video::*;
use crate::state::AppState;
use crate::utils::filename::sanitize_upload_name;

/// Body limit for the video form: two files plus the text fields.
pub fn video_form_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size
        .saturating_mul(2)
        .saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Videos",
    operation_id = "createVideo",
    summary = "Create a video",
    description = "Creates a video from a multipart form with `title`, `description`, `slug`, `thumbnail` (image) and `video` files, an optional `is_published` checkbox (absent means unpublished) and optional `tags` (tag IDs). `num_views`, `num_likes` and `published_at` are read-only; naming them is a validation error. `published_at` is set to the creation time when the video is created published. Requires `video:add` permission.",
    request_body(content = VideoFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video created", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Title or slug already used (DUPLICATE_VALUE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(title))]
pub async fn create_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("video:add")?;

    let form = read_video_form(multipart, state.config.storage.max_upload_size).await?;
    let new = NewVideo::try_from(form)?;
    tracing::Span::current().record("title", new.title.as_str());

    let txn = state.db.begin().await?;

    ensure_unique_video(&txn, Some(&new.title), Some(&new.slug), None).await?;
    ensure_tags_exist(&txn, &new.tag_ids).await?;

    let mut stored = Vec::new();
    let result = async {
        let thumbnail = store_upload(&*state.media, video::THUMBNAIL_DIR, &new.thumbnail).await?;
        stored.push(thumbnail.path.clone());
        let file = store_upload(&*state.media, video::VIDEO_DIR, &new.video).await?;
        stored.push(file.path.clone());

        let now = chrono::Utc::now();
        let model = video::ActiveModel {
            title: Set(new.title.clone()),
            description: Set(new.description.clone()),
            thumbnail: Set(thumbnail.path),
            video: Set(file.path),
            slug: Set(new.slug.clone()),
            published_at: Set(next_published_at(None, new.is_published, now)),
            is_published: Set(new.is_published),
            num_likes: Set(0),
            num_views: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_write_error)?;

        replace_tags(&txn, model.id, &new.tag_ids).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            discard_files(&*state.media, &stored).await;
            return Err(e);
        }
    };

    info!(id = model.id, slug = %model.slug, "Video created");
    let tags = load_tags(&state.db, model.id).await?;
    Ok((StatusCode::CREATED, Json(VideoResponse::new(model, tags))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List videos",
    description = "Returns a paginated list of videos. Supports case-insensitive title search, filtering by publication state and tag, and sorting by `created_at` (default, desc), `published_at`, `title`, `num_views` or `num_likes`. Requires `video:view` permission.",
    params(VideoListQuery),
    responses(
        (status = 200, description = "List of videos", body = VideoListResponse),
        (status = 400, description = "Invalid sort field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<VideoListResponse>, AppError> {
    auth_user.require_permission("video:view")?;

    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = video::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(video::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }
    if let Some(is_published) = query.is_published {
        select = select.filter(video::Column::IsPublished.eq(is_published));
    }
    if let Some(tag_id) = query.tag {
        select = select.filter(
            video::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(video_tag::Column::VideoId)
                    .from(video_tag::Entity)
                    .and_where(video_tag::Column::TagId.eq(tag_id))
                    .to_owned(),
            ),
        );
    }

    let sort_column = match query.sort_by.as_deref().unwrap_or("created_at") {
        "created_at" => video::Column::CreatedAt,
        "published_at" => video::Column::PublishedAt,
        "title" => video::Column::Title,
        "num_views" => video::Column::NumViews,
        "num_likes" => video::Column::NumLikes,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, published_at, title, num_views, num_likes"
                    .into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by(sort_column, sort_order(query.sort_order.as_deref(), Order::Desc))
        .order_by_desc(video::Column::Id)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(VideoListItem::from)
        .collect();

    Ok(Json(VideoListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Videos",
    operation_id = "getVideo",
    summary = "Get a video by ID",
    description = "Returns every field of the video, its tags and the URLs of its media. Requires `video:view` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video details", body = VideoResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VideoResponse>, AppError> {
    auth_user.require_permission("video:view")?;

    let model = find_video(&state.db, id).await?;
    let tags = load_tags(&state.db, id).await?;
    Ok(Json(VideoResponse::new(model, tags)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Videos",
    operation_id = "updateVideo",
    summary = "Update a video",
    description = "Partially updates a video from a multipart form. Only the submitted fields change; `tags` replaces the whole set (an empty value clears it) and a submitted file replaces the stored one. When `is_published` becomes true and the video was never published, `published_at` is set to now; unpublishing keeps it. Read-only fields are rejected. Requires `video:change` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    request_body(content = VideoFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video updated", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title or slug already used (DUPLICATE_VALUE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    auth_user.require_permission("video:change")?;

    let form = read_video_form(multipart, state.config.storage.max_upload_size).await?;
    let changes = VideoChanges::try_from(form)?;

    if changes.is_empty() {
        let existing = find_video(&state.db, id).await?;
        let tags = load_tags(&state.db, id).await?;
        return Ok(Json(VideoResponse::new(existing, tags)));
    }

    let txn = state.db.begin().await?;

    let existing = find_video_for_update(&txn, id).await?;
    let title = changes.title.as_deref().filter(|t| *t != existing.title);
    let slug = changes.slug.as_deref().filter(|s| *s != existing.slug);
    ensure_unique_video(&txn, title, slug, Some(id)).await?;
    if let Some(ref tag_ids) = changes.tag_ids {
        ensure_tags_exist(&txn, tag_ids).await?;
    }

    let mut stored = Vec::new();
    let mut replaced = Vec::new();
    let result = async {
        let mut active: video::ActiveModel = existing.clone().into();

        if let Some(ref file) = changes.thumbnail {
            let saved = store_upload(&*state.media, video::THUMBNAIL_DIR, file).await?;
            stored.push(saved.path.clone());
            replaced.push(existing.thumbnail.clone());
            active.thumbnail = Set(saved.path);
        }
        if let Some(ref file) = changes.video {
            let saved = store_upload(&*state.media, video::VIDEO_DIR, file).await?;
            stored.push(saved.path.clone());
            replaced.push(existing.video.clone());
            active.video = Set(saved.path);
        }
        if let Some(ref title) = changes.title {
            active.title = Set(title.clone());
        }
        if let Some(ref description) = changes.description {
            active.description = Set(description.clone());
        }
        if let Some(ref slug) = changes.slug {
            active.slug = Set(slug.clone());
        }

        let now = chrono::Utc::now();
        let is_published = changes.is_published.unwrap_or(existing.is_published);
        active.is_published = Set(is_published);
        active.published_at = Set(next_published_at(existing.published_at, is_published, now));
        active.updated_at = Set(now);

        let model = active.update(&txn).await.map_err(map_write_error)?;
        if let Some(ref tag_ids) = changes.tag_ids {
            replace_tags(&txn, id, tag_ids).await?;
        }
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            discard_files(&*state.media, &stored).await;
            return Err(e);
        }
    };

    if state.config.storage.cleanup_on_delete {
        discard_files(&*state.media, &replaced).await;
    }

    let tags = load_tags(&state.db, id).await?;
    Ok(Json(VideoResponse::new(model, tags)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    description = "Deletes the video, its tag associations and its conversion records. Tags are kept. Media files are removed only when `storage.cleanup_on_delete` is enabled. Requires `video:delete` permission.",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("video:delete")?;

    let txn = state.db.begin().await?;

    let existing = find_video_for_update(&txn, id).await?;

    video_tag::Entity::delete_many()
        .filter(video_tag::Column::VideoId.eq(id))
        .exec(&txn)
        .await?;
    conversion_error::Entity::delete_many()
        .filter(conversion_error::Column::VideoId.eq(id))
        .exec(&txn)
        .await?;
    video_conversion::Entity::delete_by_id(id).exec(&txn).await?;
    video::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!(title = %existing, "Video deleted");

    if state.config.storage.cleanup_on_delete {
        discard_files(&*state.media, &[existing.thumbnail, existing.video]).await;
        let chunks = common::conversion::chunk_dir(
            std::path::Path::new(&state.config.storage.upload_root),
            id,
        );
        if let Err(e) = tokio::fs::remove_dir_all(&chunks).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %chunks.display(), error = %e, "Failed to remove chunk directory");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_video<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<video::Model, AppError> {
    video::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}

async fn find_video_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<video::Model, AppError> {
    video::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}

/// Tags of a video, ordered by name.
async fn load_tags<C: ConnectionTrait>(db: &C, video_id: i32) -> Result<Vec<TagResponse>, AppError> {
    let tags = tag::Entity::find()
        .filter(
            tag::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(video_tag::Column::TagId)
                    .from(video_tag::Entity)
                    .and_where(video_tag::Column::VideoId.eq(video_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;
    Ok(tags.into_iter().map(TagResponse::from).collect())
}

/// Check `title` and `slug` (when given) against other videos.
async fn ensure_unique_video<C: ConnectionTrait>(
    db: &C,
    title: Option<&str>,
    slug: Option<&str>,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let checks = [
        (title, video::Column::Title, "title"),
        (slug, video::Column::Slug, "slug"),
    ];
    for (value, column, field) in checks {
        let Some(value) = value else { continue };
        let mut select = video::Entity::find().filter(column.eq(value));
        if let Some(id) = exclude_id {
            select = select.filter(video::Column::Id.ne(id));
        }
        if select.count(db).await? > 0 {
            return Err(duplicate(field));
        }
    }
    Ok(())
}

async fn ensure_tags_exist<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: Vec<i32> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::field(
            "tags",
            format!("Unknown tag ID: {}", missing.join(", ")),
        ));
    }
    Ok(())
}

/// Make `tag_ids` the exact tag set of the video.
async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    video_id: i32,
    tag_ids: &[i32],
) -> Result<(), AppError> {
    video_tag::Entity::delete_many()
        .filter(video_tag::Column::VideoId.eq(video_id))
        .exec(db)
        .await?;
    for &tag_id in tag_ids {
        video_tag::ActiveModel {
            video_id: Set(video_id),
            tag_id: Set(tag_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn duplicate(field: &'static str) -> AppError {
    AppError::duplicate(field, format!("A video with this {field} already exists"))
}

fn map_write_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            debug!("Video race: unique constraint caught on write: {detail}");
            if detail.contains("slug") {
                duplicate("slug")
            } else if detail.contains("title") {
                duplicate("title")
            } else {
                AppError::Conflict("Video conflicts with an existing record".into())
            }
        }
        _ => AppError::from(e),
    }
}

/// Collect the multipart video form, spooling files to temporary storage.
async fn read_video_form(mut multipart: Multipart, max_size: u64) -> Result<VideoForm, AppError> {
    let mut form = VideoForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match classify_field(&name) {
            FormField::Text(key) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::field(key, format!("Failed to read field: {e}")))?;
                form.push_text(key, text);
            }
            FormField::File(key) => {
                // Browsers send an empty, nameless part for an untouched file input.
                let Some(raw_name) = field.file_name().filter(|n| !n.is_empty()) else {
                    continue;
                };
                let file_name = sanitize_upload_name(raw_name)
                    .map_err(|e| AppError::field(key, e.message()))?;
                let file = spool_field(field, key, file_name, max_size).await?;
                form.set_file(key, file);
            }
            FormField::ReadOnly(key) => {
                return Err(AppError::field(key, "This field is read-only"));
            }
            FormField::Unknown => {
                debug!(field = %name, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

/// Stream one multipart file to a temporary file.
async fn spool_field(
    mut field: Field<'_>,
    key: &'static str,
    file_name: String,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let mut upload = UploadedFile {
        temp_path: temp_upload_path(),
        file_name,
        size: 0,
        head: Vec::new(),
    };

    let mut temp_file = tokio::fs::File::create(&upload.temp_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::field(key, format!("Upload read error: {e}")))?
    {
        upload.record_chunk(&chunk);
        if upload.size > max_size {
            return Err(AppError::field(
                key,
                format!("File exceeds maximum size of {max_size} bytes"),
            ));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(upload)
}

fn temp_upload_path() -> PathBuf {
    std::env::temp_dir().join(format!("catalog-upload-{}", Uuid::new_v4()))
}

/// Copy a spooled upload into the media store under `dir`.
async fn store_upload(
    media: &dyn MediaStore,
    dir: &str,
    upload: &UploadedFile,
) -> Result<StoredFile, AppError> {
    let file = tokio::fs::File::open(&upload.temp_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
    let reader: BoxReader = Box::new(file);
    Ok(media.put_stream(dir, &upload.file_name, reader).await?)
}

/// Remove media files, logging failures.
async fn discard_files(media: &dyn MediaStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = media.delete(path).await {
            warn!(path = %path, error = %e, "Failed to remove media file");
        }
    }
}

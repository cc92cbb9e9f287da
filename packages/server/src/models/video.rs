use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::admin::video_read_only_field;
use super::shared::{Pagination, required_text};
use super::tag::TagResponse;
use crate::entity::video;
use crate::error::AppError;

/// Leading bytes of an upload kept in memory for content sniffing.
pub const SNIFF_LEN: usize = 64;

/// An uploaded file spooled to a temporary location.
///
/// The temporary file is removed when the value is dropped, whether or not
/// its content was copied into the media store.
#[derive(Debug)]
pub struct UploadedFile {
    pub temp_path: PathBuf,
    /// Sanitised client file name.
    pub file_name: String,
    pub size: u64,
    /// First bytes of the content, at most [`SNIFF_LEN`].
    pub head: Vec<u8>,
}

impl UploadedFile {
    /// Record a chunk of content that was written to the temporary file.
    pub fn record_chunk(&mut self, chunk: &[u8]) {
        let wanted = SNIFF_LEN.saturating_sub(self.head.len());
        self.head.extend_from_slice(&chunk[..wanted.min(chunk.len())]);
        self.size += chunk.len() as u64;
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.temp_path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = tokio::fs::remove_file(&path).await;
                });
            }
            Err(_) => {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

/// How a multipart field of the video form is handled.
#[derive(Debug, PartialEq, Eq)]
pub enum FormField {
    Text(&'static str),
    File(&'static str),
    ReadOnly(&'static str),
    Unknown,
}

pub fn classify_field(name: &str) -> FormField {
    match name {
        "title" => FormField::Text("title"),
        "description" => FormField::Text("description"),
        "slug" => FormField::Text("slug"),
        "is_published" => FormField::Text("is_published"),
        "tags" => FormField::Text("tags"),
        "thumbnail" => FormField::File("thumbnail"),
        "video" => FormField::File("video"),
        other => match video_read_only_field(other) {
            Some(field) => FormField::ReadOnly(field),
            None => FormField::Unknown,
        },
    }
}

/// Raw values collected from a multipart video form.
#[derive(Debug, Default)]
pub struct VideoForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<String>,
    /// One entry per `tags` field; each may hold comma-separated IDs.
    pub tags: Option<Vec<String>>,
    pub thumbnail: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl VideoForm {
    /// Record a text field. `tags` accumulates; other fields keep the last value.
    pub fn push_text(&mut self, field: &'static str, value: String) {
        match field {
            "title" => self.title = Some(value),
            "description" => self.description = Some(value),
            "slug" => self.slug = Some(value),
            "is_published" => self.is_published = Some(value),
            "tags" => self.tags.get_or_insert_with(Vec::new).push(value),
            _ => {}
        }
    }

    pub fn set_file(&mut self, field: &'static str, file: UploadedFile) {
        match field {
            "thumbnail" => self.thumbnail = Some(file),
            "video" => self.video = Some(file),
            _ => {}
        }
    }
}

/// A validated video to insert. Counters and `published_at` are not part of it.
#[derive(Debug)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub tag_ids: Vec<i32>,
    pub thumbnail: UploadedFile,
    pub video: UploadedFile,
}

impl TryFrom<VideoForm> for NewVideo {
    type Error = AppError;

    fn try_from(form: VideoForm) -> Result<Self, Self::Error> {
        let title = validate_title(form.title.as_deref())?;
        let description = validate_description(form.description.as_deref())?;
        let slug = validate_slug(form.slug.as_deref())?;
        let is_published = match form.is_published.as_deref() {
            Some(raw) => parse_flag(raw)?,
            None => false,
        };
        let tag_ids = match &form.tags {
            Some(values) => parse_tag_ids(values)?,
            None => Vec::new(),
        };

        let VideoForm {
            thumbnail, video, ..
        } = form;
        let thumbnail =
            thumbnail.ok_or_else(|| AppError::field("thumbnail", "Thumbnail is required"))?;
        validate_thumbnail(&thumbnail)?;
        let video = video.ok_or_else(|| AppError::field("video", "Video is required"))?;
        validate_video_file(&video)?;

        Ok(Self {
            title,
            description,
            slug,
            is_published,
            tag_ids,
            thumbnail,
            video,
        })
    }
}

/// A validated partial update. `None` leaves the stored value unchanged.
#[derive(Debug, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
    /// Replaces the whole tag set when present.
    pub tag_ids: Option<Vec<i32>>,
    pub thumbnail: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl VideoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.slug.is_none()
            && self.is_published.is_none()
            && self.tag_ids.is_none()
            && self.thumbnail.is_none()
            && self.video.is_none()
    }
}

impl TryFrom<VideoForm> for VideoChanges {
    type Error = AppError;

    fn try_from(form: VideoForm) -> Result<Self, Self::Error> {
        let title = match form.title.as_deref() {
            Some(raw) => Some(validate_title(Some(raw))?),
            None => None,
        };
        let description = match form.description.as_deref() {
            Some(raw) => Some(validate_description(Some(raw))?),
            None => None,
        };
        let slug = match form.slug.as_deref() {
            Some(raw) => Some(validate_slug(Some(raw))?),
            None => None,
        };
        let is_published = form.is_published.as_deref().map(parse_flag).transpose()?;
        let tag_ids = form.tags.as_deref().map(parse_tag_ids).transpose()?;

        let VideoForm {
            thumbnail, video, ..
        } = form;
        if let Some(file) = &thumbnail {
            validate_thumbnail(file)?;
        }
        if let Some(file) = &video {
            validate_video_file(file)?;
        }

        Ok(Self {
            title,
            description,
            slug,
            is_published,
            tag_ids,
            thumbnail,
            video,
        })
    }
}

pub fn validate_title(raw: Option<&str>) -> Result<String, AppError> {
    required_text("title", "Title", raw, Some(video::TITLE_MAX_LEN))
}

pub fn validate_description(raw: Option<&str>) -> Result<String, AppError> {
    required_text("description", "Description", raw, None)
}

/// Slugs are 1-100 characters of ASCII letters, digits, `-` and `_`.
pub fn validate_slug(raw: Option<&str>) -> Result<String, AppError> {
    let slug = required_text("slug", "Slug", raw, Some(video::SLUG_MAX_LEN))?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::field(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens",
        ));
    }
    Ok(slug)
}

/// Parse a checkbox-style value. An empty value counts as unchecked.
pub fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(AppError::field(
            "is_published",
            format!("'{}' is not a valid boolean", raw.trim()),
        )),
    }
}

/// Parse tag IDs from repeated and/or comma-separated values.
///
/// Blank entries are skipped, so a single empty value yields an empty set.
/// Duplicates are dropped, keeping the first occurrence.
pub fn parse_tag_ids(values: &[String]) -> Result<Vec<i32>, AppError> {
    let mut ids = Vec::new();
    for part in values.iter().flat_map(|v| v.split(',')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: i32 = part
            .parse()
            .map_err(|_| AppError::field("tags", format!("'{part}' is not a valid tag ID")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub fn validate_thumbnail(file: &UploadedFile) -> Result<(), AppError> {
    if file.size == 0 {
        return Err(AppError::field("thumbnail", "The submitted file is empty"));
    }
    if image::guess_format(&file.head).is_err() {
        return Err(AppError::field(
            "thumbnail",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image",
        ));
    }
    Ok(())
}

pub fn validate_video_file(file: &UploadedFile) -> Result<(), AppError> {
    if file.size == 0 {
        return Err(AppError::field("video", "The submitted file is empty"));
    }
    Ok(())
}

/// `published_at` after a save: kept once set, otherwise stamped with `now`
/// when the video is published.
pub fn next_published_at(
    current: Option<DateTime<Utc>>,
    is_published: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match current {
        Some(at) => Some(at),
        None if is_published => Some(now),
        None => None,
    }
}

/// Full video representation returned by detail, create and update.
#[derive(Serialize, ToSchema)]
pub struct VideoResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Intro")]
    pub title: String,
    pub description: String,
    #[schema(example = "intro")]
    pub slug: String,
    /// Stored media path of the thumbnail.
    #[schema(example = "thumbnails/intro.png")]
    pub thumbnail: String,
    /// Stored media path of the video file.
    #[schema(example = "videos/intro.mp4")]
    pub video: String,
    #[schema(example = "/api/v1/videos/1/thumbnail")]
    pub thumbnail_url: String,
    #[schema(example = "/api/v1/videos/1/file")]
    pub video_url: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub num_likes: i32,
    pub num_views: i32,
    pub tags: Vec<TagResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn new(model: video::Model, tags: Vec<TagResponse>) -> Self {
        Self {
            thumbnail_url: thumbnail_url(model.id),
            video_url: video_url(model.id),
            id: model.id,
            title: model.title,
            description: model.description,
            slug: model.slug,
            thumbnail: model.thumbnail,
            video: model.video,
            is_published: model.is_published,
            published_at: model.published_at,
            num_likes: model.num_likes,
            num_views: model.num_views,
            tags,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn thumbnail_url(id: i32) -> String {
    format!("/api/v1/videos/{id}/thumbnail")
}

pub fn video_url(id: i32) -> String {
    format!("/api/v1/videos/{id}/file")
}

/// Row of the video list. Description and tags are omitted.
#[derive(Serialize, ToSchema)]
pub struct VideoListItem {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub thumbnail_url: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub num_likes: i32,
    pub num_views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<video::Model> for VideoListItem {
    fn from(model: video::Model) -> Self {
        Self {
            thumbnail_url: thumbnail_url(model.id),
            id: model.id,
            title: model.title,
            slug: model.slug,
            is_published: model.is_published,
            published_at: model.published_at,
            num_likes: model.num_likes,
            num_views: model.num_views,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VideoListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Only published (`true`) or unpublished (`false`) videos.
    pub is_published: Option<bool>,
    /// Only videos carrying this tag ID.
    pub tag: Option<i32>,
    /// `created_at` (default), `published_at`, `title`, `num_views` or `num_likes`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VideoListResponse {
    pub data: Vec<VideoListItem>,
    pub pagination: Pagination,
}

/// Multipart body of `POST /videos` and `PATCH /videos/{id}`, for the API docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct VideoFormSchema {
    /// Unique, 1-100 characters.
    title: String,
    description: String,
    /// Unique, letters, digits, `-` and `_`, 1-100 characters.
    slug: String,
    /// `true`/`on`/`1` or `false`/`off`/`0`; absent means unpublished on create.
    is_published: Option<String>,
    /// Tag IDs, repeated or comma-separated. An empty value clears the set.
    tags: Option<Vec<i32>>,
    /// Image file, stored under `thumbnails/`.
    #[schema(format = Binary, value_type = String)]
    thumbnail: Vec<u8>,
    /// Video file, stored under `videos/`.
    #[schema(format = Binary, value_type = String)]
    video: Vec<u8>,
}

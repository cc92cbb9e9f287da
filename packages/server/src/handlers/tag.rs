use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{tag, video_tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, escape_like, page_bounds, page_offset, sort_order};
use crate::models::tag::*;
use crate::state::AppState;

const DUPLICATE_NAME: &str = "A tag with this name already exists";

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    description = "Creates a tag with a unique name. Requires `tag:add` permission.",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already used (DUPLICATE_VALUE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("tag:add")?;
    let name = validate_tag_request(&payload)?;

    ensure_unique_name(&state.db, &name, None).await?;

    let model = tag::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_write_error)?;

    info!(id = model.id, name = %model, "Tag created");
    Ok((StatusCode::CREATED, Json(TagResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List tags",
    description = "Returns a paginated list of tags. Supports case-insensitive name search and sorting by `name` (default, ascending) or `id`. Requires `tag:view` permission.",
    params(TagListQuery),
    responses(
        (status = 200, description = "List of tags", body = TagListResponse),
        (status = 400, description = "Invalid sort field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_tags(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<TagListResponse>, AppError> {
    auth_user.require_permission("tag:view")?;

    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = tag::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(tag::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let sort_column = match query.sort_by.as_deref().unwrap_or("name") {
        "name" => tag::Column::Name,
        "id" => tag::Column::Id,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: name, id".into(),
            ));
        }
    };
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by(sort_column, sort_order(query.sort_order.as_deref(), Order::Asc))
        .order_by_asc(tag::Column::Id)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();

    Ok(Json(TagListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    description = "Returns the tag and the number of videos referencing it. Requires `tag:view` permission.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag details", body = TagDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagDetailResponse>, AppError> {
    auth_user.require_permission("tag:view")?;

    let model = find_tag(&state.db, id).await?;
    let video_count = video_tag::Entity::find()
        .filter(video_tag::Column::TagId.eq(id))
        .count(&state.db)
        .await?;

    Ok(Json(TagDetailResponse {
        id: model.id,
        name: model.name,
        video_count,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    description = "Changes the tag's name. The new name must be unique. Requires `tag:change` permission.",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = TagRequest,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (DUPLICATE_VALUE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    auth_user.require_permission("tag:change")?;
    let name = validate_tag_request(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_tag_for_update(&txn, id).await?;
    if existing.name == name {
        return Ok(Json(existing.into()));
    }
    ensure_unique_name(&txn, &name, Some(id)).await?;

    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name);
    let model = active.update(&txn).await.map_err(map_write_error)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes the tag and removes it from every video carrying it. The videos themselves are kept. Requires `tag:delete` permission.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("tag:delete")?;

    let txn = state.db.begin().await?;

    find_tag_for_update(&txn, id).await?;

    let detached = video_tag::Entity::delete_many()
        .filter(video_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    info!(detached = detached.rows_affected, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_tag<C: ConnectionTrait>(db: &C, id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}

async fn find_tag_for_update<C: ConnectionTrait>(db: &C, id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}

async fn ensure_unique_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = tag::Entity::find().filter(tag::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        select = select.filter(tag::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::duplicate("name", DUPLICATE_NAME));
    }
    Ok(())
}

fn map_write_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Tag name race: unique constraint caught on write");
            AppError::duplicate("name", DUPLICATE_NAME)
        }
        _ => AppError::from(e),
    }
}

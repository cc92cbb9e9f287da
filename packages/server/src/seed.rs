use common::entity::conversion_error;
use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::entity::{role, role_permission, user, video_tag};
use crate::utils::hash::hash_password;

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[role::ADMIN_ROLE, "editor", "viewer"];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "video:view"),
    ("admin", "video:add"),
    ("admin", "video:change"),
    ("admin", "video:delete"),
    ("admin", "tag:view"),
    ("admin", "tag:add"),
    ("admin", "tag:change"),
    ("admin", "tag:delete"),
    // Editor
    ("editor", "video:view"),
    ("editor", "video:add"),
    ("editor", "video:change"),
    ("editor", "tag:view"),
    ("editor", "tag:add"),
    ("editor", "tag:change"),
    // Viewer
    ("viewer", "video:view"),
    ("viewer", "tag:view"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => roles_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => perms_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Create the configured bootstrap admin if it does not exist yet.
///
/// Returns `true` when a user was created.
pub async fn ensure_admin_user(db: &DatabaseConnection, auth: &AuthConfig) -> anyhow::Result<bool> {
    let (Some(username), Some(password)) = (&auth.admin_username, &auth.admin_password) else {
        return Ok(false);
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let model = user::ActiveModel {
        username: Set(username.clone()),
        password: Set(hash_password(password)?),
        role: Set(role::ADMIN_ROLE.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(n) if n > 0 => {
            info!(username = %username, "Created bootstrap admin user");
            Ok(true)
        }
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Tag filter of the video list and video counts per tag:
    // SELECT video_id FROM video_tag WHERE tag_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_video_tag_tag")
        .table(video_tag::Entity)
        .col(video_tag::Column::TagId)
        .col(video_tag::Column::VideoId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_video_tag_tag exists"),
        Err(e) => warn!("Failed to create index idx_video_tag_tag: {}", e),
    }

    // Conversion errors of a video, newest first.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_conversion_error_video_created")
        .table(conversion_error::Entity)
        .col(conversion_error::Column::VideoId)
        .col(conversion_error::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_conversion_error_video_created exists"),
        Err(e) => warn!("Failed to create index idx_conversion_error_video_created: {}", e),
    }

    Ok(())
}

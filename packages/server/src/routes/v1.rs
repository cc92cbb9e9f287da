use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/tags", tag_routes())
        .nest("/videos", video_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::get_schema))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::tag::list_tags,
            handlers::tag::create_tag
        ))
        .routes(routes!(
            handlers::tag::get_tag,
            handlers::tag::update_tag,
            handlers::tag::delete_tag
        ))
}

fn video_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let storage = &config.storage;

    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::video::list_videos,
            handlers::video::create_video
        ))
        .routes(routes!(
            handlers::video::get_video,
            handlers::video::update_video,
            handlers::video::delete_video
        ))
        .layer(handlers::video::video_form_body_limit(
            storage.max_upload_size,
        ));

    let media = OpenApiRouter::new()
        .routes(routes!(handlers::media::download_thumbnail))
        .routes(routes!(handlers::media::download_video_file));

    let chunks = OpenApiRouter::new()
        .routes(routes!(handlers::conversion::upload_chunk))
        .layer(handlers::conversion::chunk_body_limit(storage.max_chunk_size));

    let conversion = OpenApiRouter::new()
        .routes(routes!(handlers::conversion::convert_video))
        .routes(routes!(handlers::conversion::get_conversion));

    crud.merge(media).merge(chunks).merge(conversion)
}

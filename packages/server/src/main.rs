use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemMediaStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database.url).await?;
    server::seed::seed_role_permissions(&db).await?;
    server::seed::ensure_indexes(&db).await?;
    server::seed::ensure_admin_user(&db, &config.auth).await?;

    let media = FilesystemMediaStore::new(
        PathBuf::from(&config.storage.media_root),
        config.storage.max_upload_size,
    )
    .await
    .with_context(|| format!("Failed to open media root {}", config.storage.media_root))?;
    tokio::fs::create_dir_all(&config.storage.upload_root)
        .await
        .with_context(|| format!("Failed to create upload root {}", config.storage.upload_root))?;

    let mq = if config.mq.enabled {
        match mq::init_mq(mq::MqConfig::from(&config.mq)).await {
            Ok(queue) => {
                info!(url = %config.mq.url, "Connected to message queue");
                Some(Arc::new(queue))
            }
            Err(e) => {
                warn!(error = %e, "Message queue unavailable, conversions disabled");
                None
            }
        }
    } else {
        info!("Message queue disabled");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        media: Arc::new(media),
        mq,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

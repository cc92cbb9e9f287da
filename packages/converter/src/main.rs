mod chunks;
mod config;
mod dash;
mod error;
mod handler;
mod store;

use std::sync::Arc;

use anyhow::Context;
use common::ConversionJob;
use mq::{BroccoliError, BrokerMessage, MqConfig, init_mq};
use sea_orm::{ConnectOptions, Database};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = config::ConverterAppConfig::load().context("Failed to load config")?;
    info!("Converter starting: {}", config.converter.id);

    let mut opts = ConnectOptions::new(&config.database.url);
    opts.max_connections(config.converter.concurrency as u32 + 1)
        .sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .context("Failed to connect to database")?;

    let mq = init_mq(MqConfig::from(&config.mq))
        .await
        .context("Failed to initialize MQ")?;

    info!(
        queue_name = %config.mq.queue_name,
        concurrency = config.converter.concurrency,
        ffmpeg_bin = %config.converter.ffmpeg_bin,
        "MQ connected"
    );

    let ffmpeg_bin: Arc<str> = Arc::from(config.converter.ffmpeg_bin.as_str());

    let result = mq
        .process_messages(
            &config.mq.queue_name,
            Some(config.converter.concurrency),
            None,
            move |message: BrokerMessage<ConversionJob>| {
                let db = db.clone();
                let ffmpeg_bin = Arc::clone(&ffmpeg_bin);
                async move {
                    handler::process_job(&db, &message.payload, &ffmpeg_bin).await;
                    Ok::<(), BroccoliError>(())
                }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Converter stopped unexpectedly");
    }

    Ok(())
}

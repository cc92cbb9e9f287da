pub use broccoli_queue::{
    brokers::broker::BrokerMessage, error::BroccoliError, queue::BroccoliQueue,
};
use common::ConversionJob;
use tracing::{info, instrument};

use crate::config::MqConfig;
use crate::error::MqError;

pub type MqQueue = BroccoliQueue;

pub async fn init_mq(config: MqConfig) -> Result<MqQueue, MqError> {
    BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await
        .map_err(|e| MqError::Connect(e.to_string()))
}

/// Publish a conversion job onto `queue`.
#[instrument(skip(mq, job), fields(job_id = %job.job_id, video_id = job.video_id))]
pub async fn publish_conversion(
    mq: &MqQueue,
    queue: &str,
    job: &ConversionJob,
) -> Result<(), MqError> {
    mq.publish(queue, None, job, None)
        .await
        .map_err(|e| MqError::Publish {
            queue: queue.to_string(),
            message: e.to_string(),
        })?;
    info!("Conversion job published");
    Ok(())
}

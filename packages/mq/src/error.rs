use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),

    #[error("failed to publish to '{queue}': {message}")]
    Publish { queue: String, message: String },
}

pub mod config;
pub mod error;
pub mod models;

pub use config::MqConfig;
pub use error::MqError;
pub use models::{BrokerMessage, BroccoliError, MqQueue, init_mq, publish_conversion};

pub type Mq = MqQueue;

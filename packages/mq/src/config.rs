use common::config::MqAppConfig;

/// Connection settings for the broker.
#[derive(Debug, Clone)]
pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
}

impl From<&MqAppConfig> for MqConfig {
    fn from(cfg: &MqAppConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            pool_size: cfg.pool_size,
        }
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

/// Converter-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ConverterConfig {
    /// Identifier of this converter instance. Default: "converter-1".
    #[serde(default = "default_converter_id")]
    pub id: String,
    /// Number of jobs processed concurrently. Default: 2.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// ffmpeg executable. Default: "ffmpeg".
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
}

fn default_converter_id() -> String {
    "converter-1".into()
}
fn default_concurrency() -> usize {
    2
}
fn default_ffmpeg_bin() -> String {
    "ffmpeg".into()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            id: default_converter_id(),
            concurrency: default_concurrency(),
            ffmpeg_bin: default_ffmpeg_bin(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Converter application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ConverterAppConfig {
    #[serde(default)]
    pub converter: ConverterConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl ConverterAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("converter.id", "converter-1")?
            .set_default("converter.concurrency", 2_i64)?
            .set_default("converter.ffmpeg_bin", "ffmpeg")?
            .set_default("database.url", "postgres://localhost/catalog")?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("mq.pool_size", 5_i64)?
            .set_default("mq.queue_name", "conversion_jobs")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(
                Environment::with_prefix("CATALOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

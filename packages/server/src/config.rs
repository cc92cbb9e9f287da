use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Account created on startup if it does not exist yet.
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the `thumbnails/` and `videos/` directories.
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Root of the per-video chunk directories awaiting conversion.
    #[serde(default = "default_upload_root")]
    pub upload_root: String,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: u64,
    /// Remove a video's media files when the video is deleted.
    #[serde(default)]
    pub cleanup_on_delete: bool,
}

fn default_media_root() -> String {
    "./media".into()
}
fn default_upload_root() -> String {
    "./media/uploads".into()
}
fn default_max_upload_size() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}
fn default_max_chunk_size() -> u64 {
    64 * 1024 * 1024 // 64 MiB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            upload_root: default_upload_root(),
            max_upload_size: default_max_upload_size(),
            max_chunk_size: default_max_chunk_size(),
            cleanup_on_delete: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CATALOG__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("CATALOG")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

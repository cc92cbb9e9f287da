use std::sync::Arc;

use common::storage::MediaStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Thumbnails and video files, addressed relative to the media root.
    pub media: Arc<dyn MediaStore>,
    /// Conversion queue. `None` when MQ is disabled or unreachable.
    pub mq: Option<Arc<mq::Mq>>,
}

use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::s3::StorageService;
use crate::media::probe::MediaProbe;
use crate::modules::transcode::service::TranscodeService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
    pub storage: StorageService,
    pub probe: Arc<dyn MediaProbe>,
    pub transcode: TranscodeService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        redis: RedisService,
        storage: StorageService,
        probe: Arc<dyn MediaProbe>,
        transcode: TranscodeService,
    ) -> Self {
        Self {
            config,
            db,
            redis,
            storage,
            probe,
            transcode,
        }
    }
}

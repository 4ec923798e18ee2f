use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::video::model::Video;
use crate::ports::store::PersistenceError;

/// Read side of the video catalog consumed by the transcode pipeline.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, PersistenceError>;
}

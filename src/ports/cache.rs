use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::modules::transcode::model::JobStatus;

#[derive(Debug, Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self(err.to_string())
    }
}

/// Non-authoritative, TTL-bounded mirror of job status for cheap polling.
///
/// Entries may expire at any time; readers fall through to the durable store
/// on a miss. Callers refresh the TTL at every status transition.
#[async_trait]
pub trait StatusCache: Send + Sync {
    async fn set_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn get_status(&self, job_id: Uuid) -> Result<Option<JobStatus>, CacheError>;

    async fn clear_status(&self, job_id: Uuid) -> Result<(), CacheError>;
}

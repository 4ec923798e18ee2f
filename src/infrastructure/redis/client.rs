use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::info;
use uuid::Uuid;

use crate::modules::transcode::model::JobStatus;
use crate::ports::cache::{CacheError, StatusCache};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;

        // Test connection
        let _conn = client.get_multiplexed_async_connection().await?;

        info!("✅ Connected to Redis");
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

fn job_key(job_id: Uuid) -> String {
    format!("job:{}", job_id)
}

#[async_trait]
impl StatusCache for RedisService {
    async fn set_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let () = conn
            .set_ex(job_key(job_id), status.as_str(), ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_status(&self, job_id: Uuid) -> Result<Option<JobStatus>, CacheError> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(job_key(job_id)).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    async fn clear_status(&self, job_id: Uuid) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let () = conn.del(job_key(job_id)).await?;
        Ok(())
    }
}

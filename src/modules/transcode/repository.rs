use async_trait::async_trait;
use uuid::Uuid;

use super::model::{JobStatus, NewTranscodeJob, TranscodeJob, TranscodeJobRow};
use crate::infrastructure::db::pool::DbPool;
use crate::ports::store::{JobStore, PersistenceError};

/// Postgres-backed job store. Owns the `transcode_jobs` rows; workers only
/// update status and diagnostics through `update_status`.
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, new_job: NewTranscodeJob) -> Result<TranscodeJob, PersistenceError> {
        let row = sqlx::query_as::<_, TranscodeJobRow>(
            r#"
            INSERT INTO transcode_jobs (id, video_id, status, requested_qualities)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_job.video_id)
        .bind(JobStatus::Pending.as_str())
        .bind(&new_job.requested_qualities)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TranscodeJob>, PersistenceError> {
        let row = sqlx::query_as::<_, TranscodeJobRow>("SELECT * FROM transcode_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        output_message: Option<&str>,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            UPDATE transcode_jobs
            SET status = $2,
                output_message = COALESCE($3, output_message),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(output_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::modules::transcode::model::{JobStatus, NewTranscodeJob, TranscodeJob};

#[derive(Debug, Error)]
#[error("database error: {0}")]
pub struct PersistenceError(pub String);

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        Self(err.to_string())
    }
}

/// Durable record of transcode jobs. The store owns job rows; workers only
/// ever update status and diagnostics on rows created by the submission path.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a new job and returns the full record with its generated id
    /// and timestamps. The job does not exist if this fails.
    async fn create(&self, new_job: NewTranscodeJob) -> Result<TranscodeJob, PersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TranscodeJob>, PersistenceError>;

    /// Unconditional last-writer-wins status overwrite. `output_message` is
    /// only written when provided; `updated_at` advances on every call.
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        output_message: Option<&str>,
    ) -> Result<(), PersistenceError>;
}

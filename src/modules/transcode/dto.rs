use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::model::{JobStatus, TranscodeJob};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeRequest {
    pub video_id: Uuid,
    #[validate(length(min = 1, message = "At least one quality is required"))]
    pub qualities: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeAccepted {
    pub job_id: Uuid,
}

/// Status view. A cache hit carries id and status only; a durable-store read
/// carries the full record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeJobResponse {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_qualities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<OffsetDateTime>,
}

impl TranscodeJobResponse {
    pub fn cached(id: Uuid, status: JobStatus) -> Self {
        Self {
            id,
            status,
            requested_qualities: None,
            output_message: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<TranscodeJob> for TranscodeJobResponse {
    fn from(job: TranscodeJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            requested_qualities: Some(job.requested_qualities),
            output_message: job.output_message,
            created_at: Some(job.created_at),
            updated_at: Some(job.updated_at),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a transcode job. Only moves forward: `pending → processing →
/// {completed | failed}`; a redelivered job re-enters `processing`, never
/// `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct TranscodeJob {
    pub id: Uuid,
    pub video_id: Uuid,
    pub status: JobStatus,
    pub requested_qualities: Vec<String>,
    pub output_message: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTranscodeJob {
    pub video_id: Uuid,
    pub requested_qualities: Vec<String>,
}

/// Raw row shape; status is stored as text and parsed on the way out.
#[derive(Debug, FromRow)]
pub struct TranscodeJobRow {
    pub id: Uuid,
    pub video_id: Uuid,
    pub status: String,
    pub requested_qualities: Vec<String>,
    pub output_message: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<TranscodeJobRow> for TranscodeJob {
    fn from(row: TranscodeJobRow) -> Self {
        TranscodeJob {
            id: row.id,
            video_id: row.video_id,
            // The column is CHECK-constrained to the four labels.
            status: row.status.parse().unwrap_or(JobStatus::Pending),
            requested_qualities: row.requested_qualities,
            output_message: row.output_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}

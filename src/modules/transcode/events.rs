use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::queue::QueueError;

/// Body of a queued transcode job. Lives only between publish and
/// delete/expiry; the durable record is the `transcode_jobs` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub job_id: Uuid,
    pub video_id: Uuid,
    pub qualities: Vec<String>,
    pub s3_key: String,
    pub owner_id: Uuid,
}

impl JobMessage {
    /// Deserializes and shape-checks a raw message body. Workers treat a
    /// failure here as fatal for the message: the job identity is untrusted,
    /// so nothing is updated.
    pub fn parse(body: &str) -> Result<Self, QueueError> {
        let message: JobMessage =
            serde_json::from_str(body).map_err(|e| QueueError::Malformed(e.to_string()))?;

        if message.qualities.is_empty() {
            return Err(QueueError::Malformed("qualities must be non-empty".to_string()));
        }
        if message.s3_key.is_empty() {
            return Err(QueueError::Malformed("s3Key must be non-empty".to_string()));
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_body_parses() {
        let body = format!(
            r#"{{"jobId":"{}","videoId":"{}","qualities":["720p","480p"],"s3Key":"o/originals/v.mp4","ownerId":"{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let msg = JobMessage::parse(&body).unwrap();
        assert_eq!(msg.qualities, vec!["720p", "480p"]);
    }

    #[test]
    fn missing_field_is_malformed() {
        let body = r#"{"jobId":"8c1cdbbe-7067-4a7c-9e8e-7de28f1d3f0a","qualities":["720p"]}"#;
        assert!(matches!(
            JobMessage::parse(body),
            Err(QueueError::Malformed(_))
        ));
    }

    #[test]
    fn qualities_must_be_an_array() {
        let body = format!(
            r#"{{"jobId":"{}","videoId":"{}","qualities":"720p","s3Key":"k","ownerId":"{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        assert!(matches!(
            JobMessage::parse(&body),
            Err(QueueError::Malformed(_))
        ));
    }

    #[test]
    fn empty_qualities_are_malformed() {
        let body = format!(
            r#"{{"jobId":"{}","videoId":"{}","qualities":[],"s3Key":"k","ownerId":"{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        assert!(matches!(
            JobMessage::parse(&body),
            Err(QueueError::Malformed(_))
        ));
    }
}

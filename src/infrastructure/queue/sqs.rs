use async_trait::async_trait;
use aws_sdk_sqs::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client;
use tracing::info;

use crate::modules::transcode::events::JobMessage;
use crate::ports::queue::{QueueDelivery, QueueError, WorkQueue};

/// Long-poll interval for receives.
const WAIT_TIME_SECONDS: i32 = 20;
/// Window during which a received message stays hidden from other consumers.
/// Acts as the soft per-job processing timeout; max-receive overflow goes to
/// the DLQ configured on the queue itself.
const VISIBILITY_TIMEOUT_SECONDS: i32 = 300;

#[derive(Clone)]
pub struct SqsService {
    client: Client,
    queue_url: String,
}

impl SqsService {
    pub async fn new(
        endpoint: &str,
        queue_url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .build();

        let client = Client::from_conf(config);

        info!("✅ Connected to SQS");

        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }

    fn string_attribute(value: String) -> Result<MessageAttributeValue, QueueError> {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .map_err(|e| QueueError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl WorkQueue for SqsService {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
        let body = serde_json::to_string(message)
            .map_err(|e| QueueError::Malformed(e.to_string()))?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .message_attributes("jobId", Self::string_attribute(message.job_id.to_string())?)
            .message_attributes("videoId", Self::string_attribute(message.video_id.to_string())?)
            .message_attributes("ownerId", Self::string_attribute(message.owner_id.to_string())?)
            .send()
            .await
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;

        info!("Transcoding job {} sent to queue", message.job_id);
        Ok(())
    }

    async fn receive(&self, max_messages: i32) -> Result<Vec<QueueDelivery>, QueueError> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(WAIT_TIME_SECONDS)
            .visibility_timeout(VISIBILITY_TIMEOUT_SECONDS)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;

        let deliveries = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| match (m.body, m.receipt_handle) {
                (Some(body), Some(handle)) => Some(QueueDelivery { body, handle }),
                _ => None,
            })
            .collect();

        Ok(deliveries)
    }

    async fn acknowledge(&self, handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(handle)
            .send()
            .await
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;

        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;

use crate::modules::transcode::events::JobMessage;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// One received message together with the handle needed to delete it.
#[derive(Debug, Clone)]
pub struct QueueDelivery {
    pub body: String,
    pub handle: String,
}

/// Hand-off point between the submission path and the workers.
///
/// Delivery is at-least-once: a received message stays invisible for the
/// broker's visibility window and becomes receivable again unless it is
/// acknowledged in time.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError>;

    /// Long-polls for up to the configured wait interval and returns at most
    /// `max_messages` deliveries.
    async fn receive(&self, max_messages: i32) -> Result<Vec<QueueDelivery>, QueueError>;

    /// Permanently removes a delivered message. Only call this once the
    /// corresponding job has reached a terminal status.
    async fn acknowledge(&self, handle: &str) -> Result<(), QueueError>;
}

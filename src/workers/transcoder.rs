use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::media::probe::{choose_preferred_video_stream, MediaProbe};
use crate::media::transcode::Transcoder;
use crate::modules::transcode::events::JobMessage;
use crate::modules::transcode::model::JobStatus;
use crate::modules::transcode::service::STATUS_CACHE_TTL;
use crate::modules::video::model::{Quality, SUPPORTED_CODECS};
use crate::ports::cache::StatusCache;
use crate::ports::queue::{QueueDelivery, WorkQueue};
use crate::ports::storage::BlobStorage;
use crate::ports::store::{JobStore, PersistenceError};

/// Pause after a receive error before polling again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// Single-consumer transcode worker. Pulls at most one job at a time; crash
/// safety comes from queue redelivery, so a message is only acknowledged once
/// the job is durably terminal.
pub struct TranscodeWorker {
    queue: Arc<dyn WorkQueue>,
    store: Arc<dyn JobStore>,
    cache: Arc<dyn StatusCache>,
    storage: Arc<dyn BlobStorage>,
    probe: Arc<dyn MediaProbe>,
    transcoder: Arc<dyn Transcoder>,
    work_dir: PathBuf,
}

impl TranscodeWorker {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        store: Arc<dyn JobStore>,
        cache: Arc<dyn StatusCache>,
        storage: Arc<dyn BlobStorage>,
        probe: Arc<dyn MediaProbe>,
        transcoder: Arc<dyn Transcoder>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            queue,
            store,
            cache,
            storage,
            probe,
            transcoder,
            work_dir,
        }
    }

    /// Receive loop. The shutdown token is only honored between iterations,
    /// never mid-job.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("🎥 Transcode worker started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let deliveries = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.queue.receive(1) => match received {
                    Ok(deliveries) => deliveries,
                    Err(e) => {
                        error!("Failed to receive from queue: {}", e);
                        tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                        continue;
                    }
                },
            };

            for delivery in deliveries {
                self.handle_delivery(delivery).await;
            }
        }

        info!("🎥 Transcode worker stopped");
    }

    /// Full per-message protocol: parse, mark processing, transcode, publish
    /// artifacts, mark terminal, and acknowledge only after a durable
    /// `completed`. Failures leave the message unacknowledged so the queue
    /// redelivers it.
    pub async fn handle_delivery(&self, delivery: QueueDelivery) {
        // A malformed body carries an untrusted job identity: drop it without
        // acknowledging and without touching any record.
        let message = match JobMessage::parse(&delivery.body) {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping malformed queue message: {}", e);
                return;
            }
        };

        info!("📦 Processing job {}", message.job_id);

        // A redelivered job re-enters processing; the record already exists.
        if let Err(e) = self.mark(&message, JobStatus::Processing, None).await {
            error!("Failed to mark job {} processing: {}", message.job_id, e);
            return;
        }

        match self.execute(&message).await {
            Ok(artifact_keys) => {
                let diagnostic = format!(
                    "Transcoding completed successfully, produced: {}",
                    artifact_keys.join(", ")
                );
                match self
                    .mark(&message, JobStatus::Completed, Some(&diagnostic))
                    .await
                {
                    Ok(()) => {
                        // Terminal and durable; safe to remove from the queue.
                        if let Err(e) = self.queue.acknowledge(&delivery.handle).await {
                            error!(
                                "Failed to acknowledge message for job {}: {}",
                                message.job_id, e
                            );
                        }
                        info!("✅ Job {} completed", message.job_id);
                    }
                    Err(e) => {
                        // Not acknowledged; redelivery will repeat the job.
                        error!("Failed to mark job {} completed: {}", message.job_id, e);
                    }
                }
            }
            Err(e) => {
                let diagnostic = format!("Transcoding failed: {:#}", e);
                error!("❌ Job {}: {}", message.job_id, diagnostic);
                if let Err(update_err) = self
                    .mark(&message, JobStatus::Failed, Some(&diagnostic))
                    .await
                {
                    error!(
                        "Failed to record failure of job {}: {}",
                        message.job_id, update_err
                    );
                }
                // Deliberately not acknowledged: the message becomes
                // receivable again after the visibility window and eventually
                // reaches the DLQ.
            }
        }

        self.cleanup_workspace(&message).await;
    }

    /// Fetch, probe, transcode and upload. Any error here lands in the job's
    /// terminal diagnostic.
    async fn execute(&self, message: &JobMessage) -> anyhow::Result<Vec<String>> {
        let workspace = self.workspace(message);
        let output_dir = workspace.join("outputs");
        tokio::fs::create_dir_all(&output_dir)
            .await
            .context("failed to create job workspace")?;

        let qualities = parse_qualities(&message.qualities)?;

        info!("⬇️ Downloading {} from blob storage", message.s3_key);
        let source = self
            .storage
            .get_object(&message.s3_key)
            .await
            .context("failed to fetch source from blob storage")?;

        let ext = Path::new(&message.s3_key)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let input_path = workspace.join(format!("input_{}.{}", message.video_id, ext));
        tokio::fs::write(&input_path, &source)
            .await
            .context("failed to stage source file")?;

        // Probing up front gives a clear diagnostic instead of an opaque
        // encoder error when the source has no usable stream.
        let meta = self
            .probe
            .probe(&input_path)
            .await
            .context("failed to probe source")?;
        choose_preferred_video_stream(&meta.video_streams, SUPPORTED_CODECS)
            .with_context(|| {
                format!(
                    "no supported video stream in source (supported codecs: {})",
                    SUPPORTED_CODECS.join(", ")
                )
            })?;

        info!(
            "🎞 Transcoding job {} to qualities: {}",
            message.job_id,
            message.qualities.join(", ")
        );
        let base_name = format!("output_{}", message.job_id);
        let outputs = self
            .transcoder
            .transcode_multiple_qualities(&input_path, &output_dir, &qualities, &base_name)
            .await?;

        let mut artifact_keys = Vec::with_capacity(outputs.len());
        for output in &outputs {
            let file_name = output
                .file_name()
                .and_then(|n| n.to_str())
                .context("transcoder produced an unnamed output")?;
            let key = format!(
                "{}/derived/{}/{}",
                message.owner_id, message.video_id, file_name
            );
            let data = tokio::fs::read(output)
                .await
                .with_context(|| format!("failed to read output {}", file_name))?;
            let content_type = mime_guess::from_path(output)
                .first_or_octet_stream()
                .to_string();

            info!("⬆️ Uploading {} to blob storage", key);
            self.storage
                .put_object(&key, data.into(), &content_type)
                .await
                .with_context(|| format!("failed to upload artifact {}", key))?;
            artifact_keys.push(key);
        }

        Ok(artifact_keys)
    }

    async fn mark(
        &self,
        message: &JobMessage,
        status: JobStatus,
        diagnostic: Option<&str>,
    ) -> Result<(), PersistenceError> {
        self.store
            .update_status(message.job_id, status, diagnostic)
            .await?;
        if let Err(e) = self
            .cache
            .set_status(message.job_id, status, STATUS_CACHE_TTL)
            .await
        {
            warn!(
                "Failed to mirror status of job {} to cache: {}",
                message.job_id, e
            );
        }
        Ok(())
    }

    /// Keyed by job id so concurrent workers never collide on file names.
    fn workspace(&self, message: &JobMessage) -> PathBuf {
        self.work_dir
            .join(message.owner_id.to_string())
            .join("temp")
            .join(message.job_id.to_string())
    }

    async fn cleanup_workspace(&self, message: &JobMessage) {
        let workspace = self.workspace(message);
        if let Err(e) = tokio::fs::remove_dir_all(&workspace).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean up workspace {:?}: {}", workspace, e);
            }
        }
    }
}

fn parse_qualities(labels: &[String]) -> anyhow::Result<Vec<Quality>> {
    labels
        .iter()
        .map(|label| {
            label
                .parse::<Quality>()
                .map_err(|e| anyhow::anyhow!("invalid quality in message: {}", e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::media::probe::{ProbeError, ProbeResult, VideoStreamInfo};
    use crate::media::transcode::EncodeError;
    use crate::modules::transcode::model::{NewTranscodeJob, TranscodeJob};
    use crate::ports::cache::CacheError;
    use crate::ports::queue::QueueError;
    use crate::ports::storage::StorageError;

    #[derive(Default)]
    struct MemQueue {
        acked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WorkQueue for MemQueue {
        async fn publish(&self, _message: &JobMessage) -> Result<(), QueueError> {
            Ok(())
        }

        async fn receive(&self, _max_messages: i32) -> Result<Vec<QueueDelivery>, QueueError> {
            Ok(vec![])
        }

        async fn acknowledge(&self, handle: &str) -> Result<(), QueueError> {
            self.acked.lock().unwrap().push(handle.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemStore {
        jobs: Mutex<HashMap<Uuid, TranscodeJob>>,
    }

    impl MemStore {
        fn seed(&self, id: Uuid, video_id: Uuid, qualities: &[&str]) {
            self.jobs.lock().unwrap().insert(
                id,
                TranscodeJob {
                    id,
                    video_id,
                    status: JobStatus::Pending,
                    requested_qualities: qualities.iter().map(|q| q.to_string()).collect(),
                    output_message: None,
                    created_at: OffsetDateTime::now_utc(),
                    updated_at: OffsetDateTime::now_utc(),
                },
            );
        }
    }

    #[async_trait]
    impl JobStore for MemStore {
        async fn create(&self, new_job: NewTranscodeJob) -> Result<TranscodeJob, PersistenceError> {
            let job = TranscodeJob {
                id: Uuid::new_v4(),
                video_id: new_job.video_id,
                status: JobStatus::Pending,
                requested_qualities: new_job.requested_qualities,
                output_message: None,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            };
            self.jobs.lock().unwrap().insert(job.id, job.clone());
            Ok(job)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<TranscodeJob>, PersistenceError> {
            Ok(self.jobs.lock().unwrap().get(&id).cloned())
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: JobStatus,
            output_message: Option<&str>,
        ) -> Result<(), PersistenceError> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.get_mut(&id) {
                job.status = status;
                if let Some(message) = output_message {
                    job.output_message = Some(message.to_string());
                }
                job.updated_at = OffsetDateTime::now_utc();
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemCache {
        statuses: Mutex<HashMap<Uuid, JobStatus>>,
    }

    #[async_trait]
    impl StatusCache for MemCache {
        async fn set_status(
            &self,
            job_id: Uuid,
            status: JobStatus,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            self.statuses.lock().unwrap().insert(job_id, status);
            Ok(())
        }

        async fn get_status(&self, job_id: Uuid) -> Result<Option<JobStatus>, CacheError> {
            Ok(self.statuses.lock().unwrap().get(&job_id).copied())
        }

        async fn clear_status(&self, job_id: Uuid) -> Result<(), CacheError> {
            self.statuses.lock().unwrap().remove(&job_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemBlob {
        objects: Mutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl BlobStorage for MemBlob {
        async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError(format!("no such object: {}", key)))
        }

        async fn put_object(
            &self,
            key: &str,
            body: Bytes,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), body);
            Ok(format!("s3://test/{}", key))
        }
    }

    struct StubProbe {
        codec: &'static str,
    }

    #[async_trait]
    impl MediaProbe for StubProbe {
        async fn probe(&self, _path: &Path) -> Result<ProbeResult, ProbeError> {
            Ok(ProbeResult {
                duration_seconds: 10.0,
                size_bytes: 4,
                format_name: Some("mov,mp4,m4a,3gp,3g2,mj2".to_string()),
                video_streams: vec![VideoStreamInfo {
                    index: 0,
                    codec_name: Some(self.codec.to_string()),
                    width: Some(1920),
                    height: Some(1080),
                    bit_rate: None,
                    is_default: true,
                }],
                audio_streams: vec![],
            })
        }
    }

    struct StubTranscoder {
        fail: bool,
    }

    #[async_trait]
    impl Transcoder for StubTranscoder {
        async fn transcode_to_quality(
            &self,
            _input: &Path,
            output: &Path,
            quality: Quality,
        ) -> Result<(), EncodeError> {
            if self.fail {
                return Err(EncodeError {
                    quality,
                    message: "stub encoder failure".to_string(),
                });
            }
            tokio::fs::write(output, quality.as_str()).await.unwrap();
            Ok(())
        }
    }

    struct Harness {
        message: JobMessage,
        delivery: QueueDelivery,
        queue: Arc<MemQueue>,
        store: Arc<MemStore>,
        blob: Arc<MemBlob>,
        worker: TranscodeWorker,
        _dir: tempfile::TempDir,
    }

    fn harness(codec: &'static str, fail_encode: bool, qualities: &[&str]) -> Harness {
        let owner_id = Uuid::new_v4();
        let video_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let s3_key = format!("{}/originals/{}_clip.mp4", owner_id, video_id);

        let message = JobMessage {
            job_id,
            video_id,
            qualities: qualities.iter().map(|q| q.to_string()).collect(),
            s3_key: s3_key.clone(),
            owner_id,
        };
        let delivery = QueueDelivery {
            body: serde_json::to_string(&message).unwrap(),
            handle: "receipt-1".to_string(),
        };

        let queue = Arc::new(MemQueue::default());
        let store = Arc::new(MemStore::default());
        store.seed(job_id, video_id, qualities);
        let cache = Arc::new(MemCache::default());
        let blob = Arc::new(MemBlob::default());
        blob.objects
            .lock()
            .unwrap()
            .insert(s3_key, Bytes::from_static(b"fake"));

        let dir = tempfile::tempdir().unwrap();
        let worker = TranscodeWorker::new(
            queue.clone(),
            store.clone(),
            cache.clone(),
            blob.clone(),
            Arc::new(StubProbe { codec }),
            Arc::new(StubTranscoder { fail: fail_encode }),
            dir.path().to_path_buf(),
        );

        Harness {
            message,
            delivery,
            queue,
            store,
            blob,
            worker,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn successful_job_completes_uploads_and_acknowledges() {
        let h = harness("h264", false, &["720p", "480p"]);

        h.worker.handle_delivery(h.delivery.clone()).await;

        let job = h
            .store
            .find_by_id(h.message.job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let diagnostic = job.output_message.unwrap();
        assert!(diagnostic.contains("720p"));
        assert!(diagnostic.contains("480p"));

        let expected_key = format!(
            "{}/derived/{}/output_{}_720p.mp4",
            h.message.owner_id, h.message.video_id, h.message.job_id
        );
        assert!(h.blob.objects.lock().unwrap().contains_key(&expected_key));
        assert_eq!(*h.queue.acked.lock().unwrap(), vec!["receipt-1"]);
    }

    #[tokio::test]
    async fn failed_encode_marks_failed_and_leaves_message_unacknowledged() {
        let h = harness("h264", true, &["720p"]);

        h.worker.handle_delivery(h.delivery.clone()).await;

        let job = h
            .store
            .find_by_id(h.message.job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.output_message.unwrap().contains("stub encoder failure"));
        assert!(h.queue.acked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_source_codec_fails_with_a_clear_diagnostic() {
        let h = harness("vp9", false, &["720p"]);

        h.worker.handle_delivery(h.delivery.clone()).await;

        let job = h
            .store
            .find_by_id(h.message.job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job
            .output_message
            .unwrap()
            .contains("no supported video stream"));
        assert!(h.queue.acked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_message_is_dropped_without_touching_any_job() {
        let h = harness("h264", false, &["720p"]);
        let malformed = QueueDelivery {
            body: r#"{"jobId":"not-a-uuid"}"#.to_string(),
            handle: "receipt-bad".to_string(),
        };

        h.worker.handle_delivery(malformed).await;

        let job = h
            .store
            .find_by_id(h.message.job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(h.queue.acked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn redelivered_message_reprocesses_the_same_record() {
        let h = harness("h264", false, &["360p"]);

        h.worker.handle_delivery(h.delivery.clone()).await;
        // Simulates redelivery after a crash between completion and delete.
        h.worker.handle_delivery(h.delivery.clone()).await;

        let jobs = h.store.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[&h.message.job_id].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn workspace_is_cleaned_up_after_the_job() {
        let h = harness("h264", false, &["240p"]);

        h.worker.handle_delivery(h.delivery.clone()).await;

        let workspace = h.worker.workspace(&h.message);
        assert!(!workspace.exists());
    }
}

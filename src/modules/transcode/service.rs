use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{TranscodeRequest, TranscodeJobResponse};
use super::events::JobMessage;
use super::model::{JobStatus, NewTranscodeJob, TranscodeJob};
use crate::modules::video::model::Quality;
use crate::ports::cache::StatusCache;
use crate::ports::catalog::VideoCatalog;
use crate::ports::queue::{QueueError, WorkQueue};
use crate::ports::store::{JobStore, PersistenceError};

/// Long enough to cover an end-to-end job plus buffer; refreshed at every
/// status transition.
pub const STATUS_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Video not found")]
    VideoNotFound,
    #[error("You do not own this video")]
    Forbidden,
    #[error("Requested quality is already the same as the video quality")]
    SameQuality,
    #[error("Invalid quality: {0}")]
    InvalidQuality(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Failed to queue transcoding job")]
    Queue(#[source] QueueError),
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Job not found")]
    NotFound,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Validates transcode submissions, persists the job record and hands it to
/// the work queue; also answers status reads, cache first.
#[derive(Clone)]
pub struct TranscodeService {
    catalog: Arc<dyn VideoCatalog>,
    store: Arc<dyn JobStore>,
    cache: Arc<dyn StatusCache>,
    queue: Arc<dyn WorkQueue>,
}

impl TranscodeService {
    pub fn new(
        catalog: Arc<dyn VideoCatalog>,
        store: Arc<dyn JobStore>,
        cache: Arc<dyn StatusCache>,
        queue: Arc<dyn WorkQueue>,
    ) -> Self {
        Self {
            catalog,
            store,
            cache,
            queue,
        }
    }

    pub async fn submit(
        &self,
        owner_id: Uuid,
        req: &TranscodeRequest,
    ) -> Result<TranscodeJob, SubmitError> {
        let video = self
            .catalog
            .find_by_id(req.video_id)
            .await?
            .ok_or(SubmitError::VideoNotFound)?;

        // Ownership fails closed.
        if video.owner_id != owner_id {
            return Err(SubmitError::Forbidden);
        }

        if req.qualities.len() == 1 && req.qualities[0] == video.quality {
            return Err(SubmitError::SameQuality);
        }

        for quality in &req.qualities {
            quality
                .parse::<Quality>()
                .map_err(|_| SubmitError::InvalidQuality(quality.clone()))?;
        }

        // Duplicate qualities pass through unchanged; the worker encodes each
        // occurrence.
        let job = self
            .store
            .create(NewTranscodeJob {
                video_id: video.id,
                requested_qualities: req.qualities.clone(),
            })
            .await?;

        self.mirror(job.id, JobStatus::Pending).await;

        let message = JobMessage {
            job_id: job.id,
            video_id: video.id,
            qualities: req.qualities.clone(),
            s3_key: video.url.clone(),
            owner_id,
        };

        if let Err(e) = self.queue.publish(&message).await {
            error!("Failed to queue transcoding job {}: {}", job.id, e);
            // The record already exists, so it must not stay pending with no
            // message behind it.
            if let Err(update_err) = self
                .store
                .update_status(
                    job.id,
                    JobStatus::Failed,
                    Some("Failed to queue transcoding job"),
                )
                .await
            {
                error!(
                    "Job {} left pending after publish failure, operator attention required: {}",
                    job.id, update_err
                );
            }
            self.mirror(job.id, JobStatus::Failed).await;
            return Err(SubmitError::Queue(e));
        }

        info!("Transcoding job {} queued successfully", job.id);
        Ok(job)
    }

    /// Cheap path first: a cache hit answers with id and status only; a miss
    /// or cache error falls through to the durable store.
    pub async fn job_status(&self, id: Uuid) -> Result<TranscodeJobResponse, StatusError> {
        match self.cache.get_status(id).await {
            Ok(Some(status)) => return Ok(TranscodeJobResponse::cached(id, status)),
            Ok(None) => {}
            Err(e) => warn!("Status cache read failed for job {}: {}", id, e),
        }

        let job = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(StatusError::NotFound)?;

        Ok(job.into())
    }

    /// The mirror is non-authoritative; a failed cache write is logged and
    /// swallowed.
    async fn mirror(&self, job_id: Uuid, status: JobStatus) {
        if let Err(e) = self.cache.set_status(job_id, status, STATUS_CACHE_TTL).await {
            warn!("Failed to mirror status of job {} to cache: {}", job_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::modules::video::model::Video;
    use crate::ports::cache::CacheError;

    struct MemCatalog {
        videos: HashMap<Uuid, Video>,
    }

    #[async_trait]
    impl VideoCatalog for MemCatalog {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, PersistenceError> {
            Ok(self.videos.get(&id).cloned())
        }
    }

    #[derive(Default)]
    struct MemStore {
        jobs: Mutex<HashMap<Uuid, TranscodeJob>>,
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
    struct MemQueue {
        published: Mutex<Vec<JobMessage>>,
        fail_publish: bool,
    }

    #[async_trait]
    impl WorkQueue for MemQueue {
        async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
            if self.fail_publish {
                return Err(QueueError::Unavailable("broker down".to_string()));
            }
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn receive(
            &self,
            _max_messages: i32,
        ) -> Result<Vec<crate::ports::queue::QueueDelivery>, QueueError> {
            Ok(vec![])
        }

        async fn acknowledge(&self, _handle: &str) -> Result<(), QueueError> {
            Ok(())
        }
    }

    fn video(owner_id: Uuid, quality: &str) -> Video {
        Video {
            id: Uuid::new_v4(),
            owner_id,
            original_file_name: "clip".to_string(),
            title: "clip".to_string(),
            description: None,
            url: format!("{}/originals/clip.mp4", owner_id),
            quality: quality.to_string(),
            duration_seconds: 12.5,
            size_bytes: 1024,
            is_deleted: false,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    struct Harness {
        owner: Uuid,
        video: Video,
        store: Arc<MemStore>,
        cache: Arc<MemCache>,
        queue: Arc<MemQueue>,
        service: TranscodeService,
    }

    fn harness(source_quality: &str, fail_publish: bool) -> Harness {
        let owner = Uuid::new_v4();
        let video = video(owner, source_quality);
        let catalog = Arc::new(MemCatalog {
            videos: HashMap::from([(video.id, video.clone())]),
        });
        let store = Arc::new(MemStore::default());
        let cache = Arc::new(MemCache::default());
        let queue = Arc::new(MemQueue {
            fail_publish,
            ..Default::default()
        });
        let service = TranscodeService::new(
            catalog,
            store.clone(),
            cache.clone(),
            queue.clone(),
        );
        Harness {
            owner,
            video,
            store,
            cache,
            queue,
            service,
        }
    }

    fn request(video_id: Uuid, qualities: &[&str]) -> TranscodeRequest {
        TranscodeRequest {
            video_id,
            qualities: qualities.iter().map(|q| q.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn accepted_submission_creates_pending_record_and_publishes() {
        let h = harness("1080p", false);

        let job = h
            .service
            .submit(h.owner, &request(h.video.id, &["720p", "480p"]))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.requested_qualities, vec!["720p", "480p"]);
        assert_eq!(h.store.jobs.lock().unwrap().len(), 1);
        assert_eq!(
            h.cache.statuses.lock().unwrap().get(&job.id),
            Some(&JobStatus::Pending)
        );

        let published = h.queue.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].job_id, job.id);
        assert_eq!(published[0].s3_key, h.video.url);
        assert_eq!(published[0].owner_id, h.owner);
    }

    #[tokio::test]
    async fn publish_failure_marks_the_job_failed_not_pending() {
        let h = harness("1080p", true);

        let err = h
            .service
            .submit(h.owner, &request(h.video.id, &["720p"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Queue(_)));

        let jobs = h.store.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        let job = jobs.values().next().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.output_message.is_some());
        assert_eq!(
            h.cache.statuses.lock().unwrap().get(&job.id),
            Some(&JobStatus::Failed)
        );
    }

    #[tokio::test]
    async fn single_quality_matching_the_source_is_a_noop() {
        let h = harness("720p", false);

        let err = h
            .service
            .submit(h.owner, &request(h.video.id, &["720p"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::SameQuality));
        assert!(h.store.jobs.lock().unwrap().is_empty());
        assert!(h.queue.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn source_quality_among_others_is_accepted() {
        let h = harness("720p", false);

        let job = h
            .service
            .submit(h.owner, &request(h.video.id, &["720p", "480p"]))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_quality_is_rejected_before_any_record_exists() {
        let h = harness("1080p", false);

        let err = h
            .service
            .submit(h.owner, &request(h.video.id, &["720p", "4k"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::InvalidQuality(ref q) if q == "4k"));
        assert!(h.store.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_video_is_forbidden() {
        let h = harness("1080p", false);

        let err = h
            .service
            .submit(Uuid::new_v4(), &request(h.video.id, &["720p"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Forbidden));
        assert!(h.store.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let h = harness("1080p", false);

        let err = h
            .service
            .submit(h.owner, &request(Uuid::new_v4(), &["720p"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::VideoNotFound));
    }

    #[tokio::test]
    async fn status_is_served_from_cache_when_present() {
        let h = harness("1080p", false);

        let job = h
            .service
            .submit(h.owner, &request(h.video.id, &["480p"]))
            .await
            .unwrap();

        let view = h.service.job_status(job.id).await.unwrap();
        assert_eq!(view.status, JobStatus::Pending);
        // Cache hits carry id and status only.
        assert!(view.requested_qualities.is_none());
    }

    #[tokio::test]
    async fn status_falls_through_to_the_store_on_cache_miss() {
        let h = harness("1080p", false);

        let job = h
            .service
            .submit(h.owner, &request(h.video.id, &["480p"]))
            .await
            .unwrap();
        h.cache.clear_status(job.id).await.unwrap();

        let view = h.service.job_status(job.id).await.unwrap();
        assert_eq!(view.status, JobStatus::Pending);
        assert_eq!(view.requested_qualities, Some(vec!["480p".to_string()]));
        assert!(view.created_at.is_some());
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let h = harness("1080p", false);
        let err = h.service.job_status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StatusError::NotFound));
    }
}

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::dto::{UploadAnalysis, VideoUploadResponse};
use super::model::{
    Video, ALLOWED_TYPES, DEFAULT_QUALITY, MAX_DURATION_SECONDS, MAX_FILE_SIZE, SUPPORTED_CODECS,
};
use super::repository::{NewVideo, VideoRepository};
use crate::media::probe::{choose_preferred_video_stream, MediaProbe, ProbeError, VideoStreamInfo};
use crate::modules::video::model::Quality;
use crate::ports::storage::{BlobStorage, StorageError};
use crate::ports::store::PersistenceError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,
    #[error("File size exceeds {}MB", MAX_FILE_SIZE / (1024 * 1024))]
    FileTooLarge,
    #[error("Invalid file type: {0}")]
    UnsupportedType(String),
    #[error("Video duration exceeds {max} seconds (detected {0})", max = MAX_DURATION_SECONDS)]
    DurationExceeded(f64),
    #[error("No video stream detected")]
    NoVideoStream,
    #[error("Unsupported video codec, supported: {}", SUPPORTED_CODECS.join(", "))]
    UnsupportedCodec,
    #[error("Unsupported video resolution: {0}p")]
    UnsupportedResolution(i32),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found")]
    NotFound,
    #[error("You do not own this video")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

pub struct VideoService;

impl VideoService {
    /// Stages the upload to a temp file, probes it, enforces the upload-time
    /// validation rules, then stores the original in blob storage and inserts
    /// the catalog row.
    pub async fn upload(
        state: &AppState,
        owner_id: Uuid,
        upload: UploadedFile,
        title: String,
        description: Option<String>,
    ) -> Result<VideoUploadResponse, UploadError> {
        if upload.bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if upload.bytes.len() > MAX_FILE_SIZE {
            return Err(UploadError::FileTooLarge);
        }

        let mime: mime::Mime = upload
            .content_type
            .parse()
            .map_err(|_| UploadError::UnsupportedType(upload.content_type.clone()))?;
        if !ALLOWED_TYPES.contains(&mime.essence_str()) {
            return Err(UploadError::UnsupportedType(upload.content_type.clone()));
        }

        let video_id = Uuid::new_v4();
        let ext = if mime.subtype() == "quicktime" {
            "mov".to_string()
        } else {
            mime.subtype().as_str().to_string()
        };
        let safe_base = sanitize_file_stem(&upload.file_name);
        let base_name = format!("{}_{}", video_id, safe_base);

        let temp_dir = Path::new(&state.config.upload_dir)
            .join(owner_id.to_string())
            .join("temp");
        tokio::fs::create_dir_all(&temp_dir).await?;
        let temp_path = temp_dir.join(format!("{}.{}", base_name, ext));
        tokio::fs::write(&temp_path, &upload.bytes).await?;

        let result =
            Self::validate_and_store(state, owner_id, video_id, &temp_path, &upload, title, description, &base_name, &ext).await;

        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            warn!("Failed to clean up temp upload {:?}: {}", temp_path, e);
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn validate_and_store(
        state: &AppState,
        owner_id: Uuid,
        video_id: Uuid,
        temp_path: &Path,
        upload: &UploadedFile,
        title: String,
        description: Option<String>,
        base_name: &str,
        ext: &str,
    ) -> Result<VideoUploadResponse, UploadError> {
        let meta = state.probe.probe(temp_path).await?;

        if meta.duration_seconds > MAX_DURATION_SECONDS {
            return Err(UploadError::DurationExceeded(meta.duration_seconds));
        }
        if meta.video_streams.is_empty() {
            return Err(UploadError::NoVideoStream);
        }

        let preferred = choose_preferred_video_stream(&meta.video_streams, SUPPORTED_CODECS)
            .ok_or(UploadError::UnsupportedCodec)?;
        let quality = detected_quality(preferred)?;
        let chosen_stream_index = preferred.index;

        let key = format!("{}/originals/{}.{}", owner_id, base_name, ext);
        state
            .storage
            .put_object(&key, upload.bytes.clone(), mime_essence(&upload.content_type))
            .await?;

        let video = VideoRepository::create(
            &state.db,
            NewVideo {
                id: video_id,
                owner_id,
                original_file_name: sanitize_file_stem(&upload.file_name),
                title,
                description,
                url: key,
                quality: quality.as_str().to_string(),
                duration_seconds: meta.duration_seconds,
                size_bytes: meta.size_bytes as i64,
            },
        )
        .await?;

        Ok(VideoUploadResponse {
            video,
            analysis: UploadAnalysis {
                format: meta.format_name.clone(),
                video_streams: meta.video_streams,
                chosen_stream_index,
            },
        })
    }

    pub async fn get_video(state: &AppState, owner_id: Uuid, id: Uuid) -> Result<Video, VideoError> {
        let video = VideoRepository::find_by_id(&state.db, id)
            .await?
            .ok_or(VideoError::NotFound)?;

        // Ownership fails closed.
        if video.owner_id != owner_id {
            return Err(VideoError::Forbidden);
        }

        Ok(video)
    }
}

/// Maps the chosen stream's height into the quality enumeration; a source
/// without height metadata falls back to the default label.
fn detected_quality(stream: &VideoStreamInfo) -> Result<Quality, UploadError> {
    match stream.height {
        Some(height) => {
            Quality::from_height(height).ok_or(UploadError::UnsupportedResolution(height))
        }
        None => Ok(DEFAULT_QUALITY),
    }
}

fn mime_essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or(content_type).trim()
}

/// Keeps word characters, dots and dashes; collapses everything else into a
/// single underscore so the name is safe as a storage key segment.
fn sanitize_file_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");

    let mut out = String::with_capacity(stem.len());
    let mut last_was_filler = false;
    for c in stem.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' {
            out.push(c);
            last_was_filler = false;
        } else if !last_was_filler {
            out.push('_');
            last_was_filler = true;
        }
    }
    out
}

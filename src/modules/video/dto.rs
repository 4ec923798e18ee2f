use serde::Serialize;
use utoipa::ToSchema;

use super::model::Video;
use crate::media::probe::VideoStreamInfo;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadAnalysis {
    pub format: Option<String>,
    pub video_streams: Vec<VideoStreamInfo>,
    pub chosen_stream_index: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoUploadResponse {
    pub video: Video,
    pub analysis: UploadAnalysis,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    pub video_data: Video,
}

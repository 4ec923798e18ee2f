use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read media file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unrecognized media container: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoStreamInfo {
    pub index: i32,
    pub codec_name: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub bit_rate: Option<i64>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AudioStreamInfo {
    pub index: i32,
    pub codec_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProbeResult {
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub format_name: Option<String>,
    pub video_streams: Vec<VideoStreamInfo>,
    pub audio_streams: Vec<AudioStreamInfo>,
}

/// Read-only container/stream inspection of a local media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError>;
}

/// Picks the video stream the rest of the pipeline should operate on.
///
/// Streams whose codec is not in `supported_codecs` are ignored. Among the
/// eligible ones the container-default stream wins; without a default flag the
/// greatest height wins, ties going to the earliest stream.
pub fn choose_preferred_video_stream<'a>(
    streams: &'a [VideoStreamInfo],
    supported_codecs: &[&str],
) -> Option<&'a VideoStreamInfo> {
    let eligible: Vec<&VideoStreamInfo> = streams
        .iter()
        .filter(|s| {
            s.codec_name
                .as_deref()
                .map(|c| supported_codecs.contains(&c))
                .unwrap_or(false)
        })
        .collect();

    if let Some(default) = eligible.iter().find(|s| s.is_default) {
        return Some(default);
    }

    eligible.into_iter().reduce(|best, candidate| {
        if candidate.height.unwrap_or(0) > best.height.unwrap_or(0) {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(index: i32, codec: &str, height: i32, is_default: bool) -> VideoStreamInfo {
        VideoStreamInfo {
            index,
            codec_name: Some(codec.to_string()),
            width: Some(height * 16 / 9),
            height: Some(height),
            bit_rate: None,
            is_default,
        }
    }

    #[test]
    fn prefers_container_default_over_taller_stream() {
        let streams = vec![stream(0, "h264", 480, false), stream(1, "h264", 1080, true)];
        let chosen = choose_preferred_video_stream(&streams, &["h264"]).unwrap();
        assert_eq!(chosen.index, 1);
        assert_eq!(chosen.height, Some(1080));
    }

    #[test]
    fn falls_back_to_greatest_height_without_default() {
        let streams = vec![
            stream(0, "h264", 480, false),
            stream(1, "h264", 720, false),
            stream(2, "h264", 360, false),
        ];
        let chosen = choose_preferred_video_stream(&streams, &["h264"]).unwrap();
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn height_tie_goes_to_first_stream() {
        let streams = vec![stream(0, "h264", 720, false), stream(1, "h264", 720, false)];
        let chosen = choose_preferred_video_stream(&streams, &["h264"]).unwrap();
        assert_eq!(chosen.index, 0);
    }

    #[test]
    fn unsupported_codec_yields_none() {
        let streams = vec![stream(0, "vp9", 1080, false)];
        assert!(choose_preferred_video_stream(&streams, &["h264"]).is_none());
    }

    #[test]
    fn unsupported_default_loses_to_supported_stream() {
        let streams = vec![stream(0, "vp9", 1080, true), stream(1, "h264", 480, false)];
        let chosen = choose_preferred_video_stream(&streams, &["h264"]).unwrap();
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(choose_preferred_video_stream(&[], &["h264"]).is_none());
    }
}

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::probe::{AudioStreamInfo, MediaProbe, ProbeError, ProbeResult, VideoStreamInfo};

/// `MediaProbe` backed by the `ffprobe` binary.
#[derive(Clone)]
pub struct FfprobeInspector {
    binary: String,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    format_name: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    index: i32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    bit_rate: Option<String>,
    disposition: Option<FfprobeDisposition>,
}

#[derive(Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: i32,
}

#[async_trait]
impl MediaProbe for FfprobeInspector {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        // Fails early with an IO error if the file is unreadable, so ffprobe
        // exit codes only ever mean "not a recognizable container".
        let metadata = tokio::fs::metadata(path).await?;

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Unrecognized(stderr.trim().to_string()));
        }

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Unrecognized(format!("invalid ffprobe output: {}", e)))?;

        let format = parsed.format;
        let duration_seconds = format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);
        let size_bytes = format
            .as_ref()
            .and_then(|f| f.size.as_deref())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(metadata.len());
        let format_name = format.and_then(|f| f.format_name);

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();

        for stream in parsed.streams {
            match stream.codec_type.as_deref() {
                Some("video") => video_streams.push(VideoStreamInfo {
                    index: stream.index,
                    codec_name: stream.codec_name,
                    width: stream.width,
                    height: stream.height,
                    bit_rate: stream.bit_rate.and_then(|b| b.parse::<i64>().ok()),
                    is_default: stream.disposition.map(|d| d.default == 1).unwrap_or(false),
                }),
                Some("audio") => audio_streams.push(AudioStreamInfo {
                    index: stream.index,
                    codec_name: stream.codec_name,
                }),
                _ => {}
            }
        }

        Ok(ProbeResult {
            duration_seconds,
            size_bytes,
            format_name,
            video_streams,
            audio_streams,
        })
    }
}

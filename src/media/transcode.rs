use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::modules::video::model::Quality;

#[derive(Debug, Error)]
#[error("encoding to {quality} failed: {message}")]
pub struct EncodeError {
    pub quality: Quality,
    pub message: String,
}

/// Produces derived renditions of a source file via an external encoder.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encodes `input` to `output` at the target quality. On failure no file
    /// may remain at `output`.
    async fn transcode_to_quality(
        &self,
        input: &Path,
        output: &Path,
        quality: Quality,
    ) -> Result<(), EncodeError>;

    /// Runs one encode per requested quality, sequentially, and returns the
    /// produced paths in request order. The first failing quality fails the
    /// whole call; outputs already produced for earlier qualities are left on
    /// disk for the caller to keep or clean up.
    async fn transcode_multiple_qualities(
        &self,
        input: &Path,
        output_dir: &Path,
        qualities: &[Quality],
        base_name: &str,
    ) -> Result<Vec<PathBuf>, EncodeError> {
        let mut outputs = Vec::with_capacity(qualities.len());

        for quality in qualities {
            let output = output_dir.join(format!("{}_{}.mp4", base_name, quality.as_str()));
            self.transcode_to_quality(input, &output, *quality).await?;
            outputs.push(output);
        }

        Ok(outputs)
    }
}

/// `Transcoder` backed by the `ffmpeg` binary: libx264 veryfast CRF 23, aac
/// audio, faststart metadata, scaled to the target height with an even width.
#[derive(Clone)]
pub struct FfmpegTranscoder {
    binary: String,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode_to_quality(
        &self,
        input: &Path,
        output: &Path,
        quality: Quality,
    ) -> Result<(), EncodeError> {
        // Encode into a temp name and rename on success, so a crashed or
        // failed run never leaves a truncated file at the advertised path.
        let partial = output.with_extension("mp4.part");

        let result = Command::new(&self.binary)
            .arg("-i")
            .arg(input)
            .args(["-vf", &format!("scale=-2:{}", quality.height())])
            .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "23"])
            .args(["-c:a", "aac"])
            .args(["-movflags", "+faststart"])
            .args(["-f", "mp4", "-y"])
            .arg(&partial)
            .output()
            .await;

        let output_info = match result {
            Ok(o) => o,
            Err(e) => {
                return Err(EncodeError {
                    quality,
                    message: format!("failed to spawn ffmpeg: {}", e),
                });
            }
        };

        if !output_info.status.success() {
            let _ = tokio::fs::remove_file(&partial).await;
            let stderr = String::from_utf8_lossy(&output_info.stderr);
            let diagnostic = stderr.lines().last().unwrap_or("ffmpeg exited abnormally");
            return Err(EncodeError {
                quality,
                message: diagnostic.to_string(),
            });
        }

        tokio::fs::rename(&partial, output).await.map_err(|e| {
            let _ = std::fs::remove_file(&partial);
            EncodeError {
                quality,
                message: format!("failed to finalize output file: {}", e),
            }
        })
    }
}

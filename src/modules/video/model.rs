use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

pub const ALLOWED_TYPES: &[&str] = &["video/mp4", "video/quicktime"];
pub const MAX_FILE_SIZE: usize = 100 * 1024 * 1024; // 100MB
pub const MAX_DURATION_SECONDS: f64 = 60.0 * 60.0; // 1 hour
pub const SUPPORTED_CODECS: &[&str] = &["h264"];
pub const DEFAULT_QUALITY: Quality = Quality::Q1080p;

/// Target vertical resolution label from the fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Quality {
    #[serde(rename = "1080p")]
    Q1080p,
    #[serde(rename = "720p")]
    Q720p,
    #[serde(rename = "480p")]
    Q480p,
    #[serde(rename = "360p")]
    Q360p,
    #[serde(rename = "240p")]
    Q240p,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Q1080p => "1080p",
            Quality::Q720p => "720p",
            Quality::Q480p => "480p",
            Quality::Q360p => "360p",
            Quality::Q240p => "240p",
        }
    }

    pub fn height(&self) -> i32 {
        match self {
            Quality::Q1080p => 1080,
            Quality::Q720p => 720,
            Quality::Q480p => 480,
            Quality::Q360p => 360,
            Quality::Q240p => 240,
        }
    }

    pub fn from_height(height: i32) -> Option<Self> {
        match height {
            1080 => Some(Quality::Q1080p),
            720 => Some(Quality::Q720p),
            480 => Some(Quality::Q480p),
            360 => Some(Quality::Q360p),
            240 => Some(Quality::Q240p),
            _ => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1080p" => Ok(Quality::Q1080p),
            "720p" => Ok(Quality::Q720p),
            "480p" => Ok(Quality::Q480p),
            "360p" => Ok(Quality::Q360p),
            "240p" => Ok(Quality::Q240p),
            other => Err(format!("unknown quality: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_file_name: String,
    pub title: String,
    pub description: Option<String>,
    /// Blob-storage key of the original upload (`<ownerId>/originals/...`).
    pub url: String,
    pub quality: String, // Stored as string in DB
    pub duration_seconds: f64,
    pub size_bytes: i64,
    pub is_deleted: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

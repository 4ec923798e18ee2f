use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::Video;
use crate::infrastructure::db::pool::DbPool;
use crate::ports::catalog::VideoCatalog;
use crate::ports::store::PersistenceError;

pub struct VideoRepository;

pub struct NewVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_file_name: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub quality: String,
    pub duration_seconds: f64,
    pub size_bytes: i64,
}

impl VideoRepository {
    pub async fn create(pool: &PgPool, new_video: NewVideo) -> Result<Video, PersistenceError> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, owner_id, original_file_name, title, description, url, quality, duration_seconds, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new_video.id)
        .bind(new_video.owner_id)
        .bind(&new_video.original_file_name)
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(&new_video.url)
        .bind(&new_video.quality)
        .bind(new_video.duration_seconds)
        .bind(new_video.size_bytes)
        .fetch_one(pool)
        .await?;

        Ok(video)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Video>, PersistenceError> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(video)
    }
}

/// Postgres-backed read side of the catalog consumed by the transcode
/// submission path.
pub struct PgVideoCatalog {
    pool: DbPool,
}

impl PgVideoCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoCatalog for PgVideoCatalog {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, PersistenceError> {
        VideoRepository::find_by_id(&self.pool, id).await
    }
}

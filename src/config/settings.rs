use serde::Deserialize;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub minio_url: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub sqs_endpoint: String,
    pub sqs_queue_url: String,
    pub jwt_secret: String,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            redis_url: env::get(EnvKey::RedisUrl)?,
            minio_url: env::get(EnvKey::MinioUrl)?,
            minio_bucket: env::get(EnvKey::MinioBucket)?,
            minio_access_key: env::get(EnvKey::MinioAccessKey)?,
            minio_secret_key: env::get(EnvKey::MinioSecretKey)?,
            sqs_endpoint: env::get(EnvKey::SqsEndpoint)?,
            sqs_queue_url: env::get(EnvKey::SqsQueueUrl)?,
            jwt_secret: env::get(EnvKey::JwtSecret)?,
            upload_dir: env::get_or(EnvKey::UploadDir, "./uploads"),
        })
    }
}

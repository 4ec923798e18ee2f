use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

use mediamill::app;
use mediamill::config::settings::AppConfig;
use mediamill::infrastructure::db::pool::{connect_to_db, run_migrations};
use mediamill::infrastructure::queue::sqs::SqsService;
use mediamill::infrastructure::redis::client::RedisService;
use mediamill::infrastructure::storage::s3::StorageService;
use mediamill::media::ffprobe::FfprobeInspector;
use mediamill::modules::transcode::repository::PgJobStore;
use mediamill::modules::transcode::service::TranscodeService;
use mediamill::modules::video::repository::PgVideoCatalog;
use mediamill::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = AppConfig::new().expect("Missing required environment variables");

    let db = connect_to_db(&config.database_url)
        .await
        .expect("Failed to connect to PostgreSQL");
    run_migrations(&db).await.expect("Failed to run migrations");

    let redis = RedisService::new(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_bucket,
        &config.minio_access_key,
        &config.minio_secret_key,
    )
    .await;

    let queue = SqsService::new(
        &config.sqs_endpoint,
        &config.sqs_queue_url,
        &config.minio_access_key,
        &config.minio_secret_key,
    )
    .await;

    let transcode = TranscodeService::new(
        Arc::new(PgVideoCatalog::new(db.clone())),
        Arc::new(PgJobStore::new(db.clone())),
        Arc::new(redis.clone()),
        Arc::new(queue),
    );

    let state = AppState::new(
        config.clone(),
        db,
        redis,
        storage,
        Arc::new(FfprobeInspector::default()),
        transcode,
    );

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}

use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mediamill::config::settings::AppConfig;
use mediamill::infrastructure::db::pool::connect_to_db;
use mediamill::infrastructure::queue::sqs::SqsService;
use mediamill::infrastructure::redis::client::RedisService;
use mediamill::infrastructure::storage::s3::StorageService;
use mediamill::media::ffprobe::FfprobeInspector;
use mediamill::media::transcode::FfmpegTranscoder;
use mediamill::modules::transcode::repository::PgJobStore;
use mediamill::workers::transcoder::TranscodeWorker;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting transcode worker...");

    let config = AppConfig::new().expect("Missing required environment variables");

    let db = connect_to_db(&config.database_url)
        .await
        .expect("Failed to connect to PostgreSQL");

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

    let worker = TranscodeWorker::new(
        Arc::new(queue),
        Arc::new(PgJobStore::new(db)),
        Arc::new(redis),
        Arc::new(storage),
        Arc::new(FfprobeInspector::default()),
        Arc::new(FfmpegTranscoder::default()),
        PathBuf::from(&config.upload_dir),
    );

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    worker.run(shutdown).await;

    info!("Transcode worker stopped");
}

/// Flips the cancellation token on SIGINT or SIGTERM. The worker only checks
/// it between jobs, so an in-flight transcode always runs to completion.
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = ctrl_c => info!("Received SIGINT, shutting down after current job"),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down after current job"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("Received SIGINT, shutting down after current job");
        }

        shutdown.cancel();
    });
}

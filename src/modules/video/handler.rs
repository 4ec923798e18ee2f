use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use tracing::info;
use uuid::Uuid;

use super::dto::{VideoResponse, VideoUploadResponse};
use super::service::{UploadError, UploadedFile, VideoError, VideoService};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::TokenClaims;
use crate::state::AppState;

/// Upload a source video
///
/// Multipart form with a `file` part plus optional `title` and `description`
/// text parts. The file is probed and validated before it is accepted.
#[utoipa::path(
    post,
    path = "/api/v1/videos/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded", body = ApiResponse<VideoUploadResponse>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Video",
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<UploadedFile> = None;
    let mut title = String::new();
    let mut description: Option<String> = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.mp4").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        return ApiError(
                            format!("Failed to read upload: {}", e),
                            StatusCode::BAD_REQUEST,
                        )
                        .into_response()
                    }
                };
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "title" => title = field.text().await.unwrap_or_default(),
            "description" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            _ => {}
        }
    }

    let file = match file {
        Some(f) => f,
        None => return ApiError("No file provided".to_string(), StatusCode::BAD_REQUEST).into_response(),
    };

    info!("Starting upload for user {}: {}", claims.sub, file.file_name);

    match VideoService::upload(&state, claims.sub, file, title, description).await {
        Ok(res) => ApiSuccess(
            ApiResponse::success(res, "Video uploaded successfully"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => {
            let status = match &e {
                UploadError::Probe(_)
                | UploadError::Storage(_)
                | UploadError::Persistence(_)
                | UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            ApiError(e.to_string(), status).into_response()
        }
    }
}

/// Fetch one of the caller's videos
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Get Video", body = ApiResponse<VideoResponse>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Video Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Video",
    security(("bearer_auth" = []))
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match VideoService::get_video(&state, claims.sub, id).await {
        Ok(video) => ApiSuccess(
            ApiResponse::success(
                VideoResponse { video_data: video },
                "Video retrieved successfully",
            ),
            StatusCode::OK,
        )
        .into_response(),
        Err(VideoError::NotFound) => {
            ApiError("Video not found".to_string(), StatusCode::NOT_FOUND).into_response()
        }
        Err(VideoError::Forbidden) => {
            ApiError("You do not own this video".to_string(), StatusCode::FORBIDDEN).into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

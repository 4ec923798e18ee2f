use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use super::dto::{TranscodeAccepted, TranscodeJobResponse, TranscodeRequest};
use super::service::{StatusError, SubmitError};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::middleware::auth::TokenClaims;
use crate::state::AppState;

/// Request derived renditions of an owned video
#[utoipa::path(
    post,
    path = "/api/v1/transcode",
    request_body = TranscodeRequest,
    responses(
        (status = 202, description = "Job accepted", body = ApiResponse<TranscodeAccepted>),
        (status = 400, description = "Bad Request"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Video Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Transcode",
    security(("bearer_auth" = []))
)]
pub async fn request_transcode_job(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(req): Json<TranscodeRequest>,
) -> impl IntoResponse {
    if let Err(e) = req.validate() {
        return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    match state.transcode.submit(claims.sub, &req).await {
        Ok(job) => ApiSuccess(
            ApiResponse::success(TranscodeAccepted { job_id: job.id }, "Transcode job accepted"),
            StatusCode::ACCEPTED,
        )
        .into_response(),
        Err(e) => {
            let status = match &e {
                SubmitError::VideoNotFound => StatusCode::NOT_FOUND,
                SubmitError::Forbidden => StatusCode::FORBIDDEN,
                SubmitError::SameQuality | SubmitError::InvalidQuality(_) => {
                    StatusCode::BAD_REQUEST
                }
                SubmitError::Persistence(_) | SubmitError::Queue(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            ApiError(e.to_string(), status).into_response()
        }
    }
}

/// Poll a transcode job's status
///
/// Served from the fast-path cache when possible; a cache hit returns id and
/// status only, a durable read returns the full record.
#[utoipa::path(
    get,
    path = "/api/v1/transcode/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job status", body = ApiResponse<TranscodeJobResponse>),
        (status = 404, description = "Job Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Transcode",
    security(("bearer_auth" = []))
)]
pub async fn get_transcode_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.transcode.job_status(id).await {
        Ok(job) => ApiSuccess(
            ApiResponse::success(job, "Job status retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(StatusError::NotFound) => {
            ApiError("Job not found".to_string(), StatusCode::NOT_FOUND).into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

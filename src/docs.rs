use utoipa::OpenApi;
use crate::modules::transcode::dto::*;
use crate::modules::video::dto::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::upload_video,
        crate::modules::video::handler::get_video,
        crate::modules::transcode::handler::request_transcode_job,
        crate::modules::transcode::handler::get_transcode_job,
    ),
    components(
        schemas(
            TranscodeRequest, TranscodeAccepted, TranscodeJobResponse,
            VideoUploadResponse, VideoResponse, UploadAnalysis,
            crate::modules::video::model::Video,
            crate::modules::video::model::Quality,
            crate::modules::transcode::model::JobStatus,
        )
    ),
    tags(
        (name = "Video", description = "Video upload and catalog"),
        (name = "Transcode", description = "Asynchronous transcode jobs")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

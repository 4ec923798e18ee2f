use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/upload", post(handler::upload_video))
        .route("/{id}", get(handler::get_video))
        // Cap bodies a little above the file-size limit to leave room for the
        // multipart framing.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(model::MAX_FILE_SIZE + 1024 * 1024))
        .route_layer(middleware::from_fn(crate::middleware::role::user_guard))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}

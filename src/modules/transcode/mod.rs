use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::state::AppState;

pub mod dto;
pub mod events;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handler::request_transcode_job))
        .route("/{id}", get(handler::get_transcode_job))
        .route_layer(middleware::from_fn(crate::middleware::role::user_guard))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}

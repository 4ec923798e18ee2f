use crate::middleware::auth::TokenClaims;
use crate::common::response::ApiError;
use axum::{
    extract::{Request, Extension},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub async fn user_guard(
    Extension(claims): Extension<TokenClaims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if claims.role != "user" {
        return Err(ApiError("Forbidden: User role required".to_string(), StatusCode::FORBIDDEN));
    }

    Ok(next.run(req).await)
}

//! API key middleware
//!
//! `POST /print` requires the `X-API-Key` header to match the configured
//! secret. When no secret is configured, every print request is rejected -
//! an unauthenticated bridge must not drive hardware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::core::ServerState;
use crate::utils::AppError;

pub async fn require_api_key(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    let expected = state.config.api_key.as_str();

    match provided {
        Some(key) if !expected.is_empty() && key == expected => Ok(next.run(req).await),
        Some(_) => {
            warn!("Rejected print request with wrong API key");
            Err(AppError::Unauthorized)
        }
        None => {
            warn!("Rejected print request without API key");
            Err(AppError::Unauthorized)
        }
    }
}

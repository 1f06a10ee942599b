//! API routing
//!
//! # Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /print | POST | X-API-Key |
//! | /status | GET | none |
//! | /health | GET | none |

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod auth;
pub mod health;
pub mod print;
pub mod status;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a fully configured application router
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    Router::new()
        // Print API - API key required
        .merge(print::router().route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        )))
        // Status API - public (informational)
        .merge(status::router())
        // Health API - public
        .merge(health::router())
        // ========== Tower HTTP Middleware ==========
        // CORS - the bridge is called from browser contexts on this machine
        .layer(CorsLayer::permissive())
        // Trace - request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - generate and propagate a unique ID per request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
}

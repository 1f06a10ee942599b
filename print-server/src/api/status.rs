//! Status API
//!
//! Informational, never authenticated: reports liveness and the printers
//! visible right now. Discovery runs inline on every call so the answer
//! matches what the next print would see.

use axum::{Json, Router, extract::State, routing::get};
use pos_printer::PrinterCandidate;
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/status", get(status))
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    version: &'static str,
    printers: Vec<PrinterCandidate>,
}

/// GET /status - liveness plus the fresh discovery list
pub async fn status(State(state): State<ServerState>) -> Json<StatusResponse> {
    let printers = state.dispatcher.discover().await;

    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        printers,
    })
}

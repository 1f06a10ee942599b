//! Print API
//!
//! The thin front of the dispatcher: deserialize, submit, map the result.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;

use crate::core::ServerState;
use crate::printing::PrintRequest;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/print", post(print))
}

#[derive(Serialize)]
pub struct PrintResponse {
    success: bool,
    printer: String,
}

/// POST /print - render and deliver one print job
pub async fn print(
    State(state): State<ServerState>,
    Json(request): Json<PrintRequest>,
) -> AppResult<Json<PrintResponse>> {
    let ticket = state.dispatcher.submit(&request).await?;

    Ok(Json(PrintResponse {
        success: true,
        printer: ticket.printer,
    }))
}

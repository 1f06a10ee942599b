//! Unified error handling
//!
//! Application-level error type and its HTTP rendering.
//!
//! # Status map
//!
//! | Kind | Status |
//! |------|--------|
//! | ValidationError | 400 |
//! | Unauthorized | 401 |
//! | NoPrinterFound | 502 |
//! | DeviceOpenError | 500 |
//! | SpoolSubmissionError | 500 |
//! | PrinterNotConnectedError | 500 |
//! | Timeout | 504 |
//! | InternalError | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pos_printer::PrintError;
use serde::Serialize;
use tracing::error;

use crate::printing::DispatchError;

/// JSON error body
///
/// ```json
/// { "error": "SpoolSubmissionError", "details": "lp: The printer ... " }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or incomplete request (400)
    #[error("{0}")]
    Validation(String),

    /// Missing or wrong API key (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Directory resolve found nothing (502)
    #[error("{0}")]
    NoPrinterFound(String),

    /// USB device could not be opened (500)
    #[error("{0}")]
    DeviceOpen(String),

    /// OS spooler rejected the job (500)
    #[error("{0}")]
    SpoolSubmission(String),

    /// Driver queue failed its connectivity check (500)
    #[error("{0}")]
    PrinterNotConnected(String),

    /// Delivery exceeded the configured bound (504)
    #[error("{0}")]
    Timeout(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Stable kind name carried in the `error` field
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Unauthorized => "Unauthorized",
            AppError::NoPrinterFound(_) => "NoPrinterFound",
            AppError::DeviceOpen(_) => "DeviceOpenError",
            AppError::SpoolSubmission(_) => "SpoolSubmissionError",
            AppError::PrinterNotConnected(_) => "PrinterNotConnectedError",
            AppError::Timeout(_) => "Timeout",
            AppError::Internal(_) => "InternalError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NoPrinterFound(_) => StatusCode::BAD_GATEWAY,
            AppError::DeviceOpen(_)
            | AppError::SpoolSubmission(_)
            | AppError::PrinterNotConnected(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
        }

        // Unauthorized carries no details; everything else surfaces the
        // originating error text
        let details = match &self {
            AppError::Unauthorized => None,
            other => Some(other.to_string()),
        };

        let body = Json(ErrorBody {
            error: self.kind(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Validation(v) => AppError::Validation(v.to_string()),
            DispatchError::NoPrinterFound(matcher) => AppError::NoPrinterFound(matcher),
            DispatchError::TransportUnavailable(kind) => {
                AppError::Internal(format!("no transport configured for {}", kind))
            }
            DispatchError::Timeout(d) => {
                AppError::Timeout(format!("delivery exceeded {}ms", d.as_millis()))
            }
            DispatchError::Delivery(p) => match p {
                PrintError::DeviceOpen(m) => AppError::DeviceOpen(m),
                PrintError::SpoolSubmission(m) => AppError::SpoolSubmission(m),
                PrintError::PrinterNotConnected(m) | PrintError::Connection(m) => {
                    AppError::PrinterNotConnected(m)
                }
                PrintError::Timeout(m) => AppError::Timeout(m),
                PrintError::NoPrinterFound(m) => AppError::NoPrinterFound(m),
                other => AppError::Internal(other.to_string()),
            },
        }
    }
}

/// Application-level Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::ValidationError;
    use std::time::Duration;

    #[test]
    fn test_dispatch_error_mapping() {
        let err: AppError = DispatchError::Validation(ValidationError::EmptyItems).into();
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = DispatchError::NoPrinterFound("any printer".into()).into();
        assert_eq!(err.kind(), "NoPrinterFound");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err: AppError =
            DispatchError::Delivery(PrintError::SpoolSubmission("lp failed".into())).into();
        assert_eq!(err.kind(), "SpoolSubmissionError");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = DispatchError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_backend_timeout_maps_to_timeout() {
        let err: AppError = DispatchError::Delivery(PrintError::Timeout("stalled".into())).into();
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}

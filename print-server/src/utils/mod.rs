//! Utility module - error types and logging

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ErrorBody};
pub use logger::init_logger;

//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// USB device could not be opened or claimed
    #[error("Device open failed: {0}")]
    DeviceOpen(String),

    /// OS spooler rejected or failed the submission
    #[error("Spool submission failed: {0}")]
    SpoolSubmission(String),

    /// Driver-queue printer failed its pre-flight connectivity check
    #[error("Printer not connected: {0}")]
    PrinterNotConnected(String),

    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// No discovered candidate satisfied the matcher
    #[error("No printer matched: {0}")]
    NoPrinterFound(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

//! Spooler transport (OS print submission)
//!
//! Writes the job to a scratch file and hands it to the system spooler
//! with `lp -o raw`, so the bytes reach the device without any filter
//! mangling the ESC/POS stream. The scratch file is a [`NamedTempFile`],
//! which is removed on drop - including every error path.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use super::Transport;
use crate::candidate::{PrinterAddress, PrinterCandidate, TransportKind};
use crate::error::{PrintError, PrintResult};

/// OS spooler transport
#[derive(Debug, Default)]
pub struct SpoolerTransport;

impl SpoolerTransport {
    pub fn new() -> Self {
        Self
    }

    fn target_queue<'a>(target: &'a PrinterCandidate) -> PrintResult<&'a str> {
        match &target.address {
            PrinterAddress::Queue(queue) => Ok(queue),
            _ => Err(PrintError::InvalidConfig(format!(
                "spooler transport cannot address {}",
                target.address
            ))),
        }
    }
}

/// Write the job bytes to a scratch file for submission
///
/// The returned handle owns the file; dropping it removes the file.
fn spool_file(job: &[u8]) -> PrintResult<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(job)?;
    file.flush()?;
    Ok(file)
}

#[cfg(unix)]
mod platform {
    use tokio::process::Command;

    use crate::candidate::PrinterCandidate;
    use crate::error::{PrintError, PrintResult};

    /// Enumerate spooler queues with `lpstat -e`
    pub async fn list_queues() -> PrintResult<Vec<PrinterCandidate>> {
        let output = Command::new("lpstat")
            .arg("-e")
            .output()
            .await
            .map_err(|e| PrintError::SpoolSubmission(format!("failed to run lpstat: {}", e)))?;

        if !output.status.success() {
            return Err(PrintError::SpoolSubmission(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|queue| PrinterCandidate::spooler(queue, queue))
            .collect())
    }

    /// Submit a spooled file to a queue with `lp -o raw`
    pub async fn submit(queue: &str, path: &std::path::Path) -> PrintResult<()> {
        let output = Command::new("lp")
            .args(["-d", queue, "-o", "raw"])
            .arg(path)
            .output()
            .await
            .map_err(|e| PrintError::SpoolSubmission(format!("failed to run lp: {}", e)))?;

        if !output.status.success() {
            return Err(PrintError::SpoolSubmission(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod platform {
    use crate::candidate::PrinterCandidate;
    use crate::error::{PrintError, PrintResult};

    pub async fn list_queues() -> PrintResult<Vec<PrinterCandidate>> {
        Ok(Vec::new())
    }

    pub async fn submit(_queue: &str, _path: &std::path::Path) -> PrintResult<()> {
        Err(PrintError::SpoolSubmission(
            "spooler printing not supported on this platform".to_string(),
        ))
    }
}

#[async_trait]
impl Transport for SpoolerTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Spooler
    }

    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>> {
        platform::list_queues().await
    }

    #[instrument(skip(self, job), fields(printer = %target.name, data_len = job.len()))]
    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()> {
        let queue = Self::target_queue(target)?;

        let file = spool_file(job)?;
        let result = platform::submit(queue, file.path()).await;
        // file dropped here: scratch file removed whether submission
        // succeeded or not
        drop(file);

        if result.is_ok() {
            info!("Job handed to spooler");
        }
        result
    }
}

//! Transport backends for delivering ESC/POS data
//!
//! Each backend knows two things: which printers it can see right now
//! ([`Transport::discover`]) and how to push a byte buffer to one of them
//! ([`Transport::deliver`]). Platform-specific mechanisms (libusb, the OS
//! spooler, the Windows driver API, raw TCP) stay isolated behind this one
//! contract so the dispatcher never needs to know which is installed.

mod network;
mod queue;
mod spooler;
mod usb;

pub use network::NetworkTransport;
pub use queue::QueueTransport;
pub use spooler::SpoolerTransport;
pub use usb::UsbTransport;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::candidate::{PrinterCandidate, TransportKind};
use crate::error::{PrintError, PrintResult};

/// Capability contract for printer transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// The transport family this backend serves
    fn kind(&self) -> TransportKind;

    /// Enumerate the printers currently reachable through this backend
    ///
    /// Called fresh on every dispatch; implementations must not cache.
    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>>;

    /// Send a rendered job to one concrete printer
    ///
    /// Implementations must release every acquired resource (device
    /// handles, scratch files) on all exit paths.
    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()>;

    /// Check whether a target is reachable right now
    async fn is_online(&self, target: &PrinterCandidate) -> bool {
        match self.discover().await {
            Ok(candidates) => candidates.iter().any(|c| c.address == target.address),
            Err(_) => false,
        }
    }
}

/// In-memory fake transport for tests
///
/// Serves a canned candidate list and records every delivery instead of
/// touching hardware. `failing` makes every delivery fail with a fixed
/// error message so error paths can be exercised.
pub struct MemoryTransport {
    kind: TransportKind,
    candidates: Vec<PrinterCandidate>,
    fail_with: Option<String>,
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryTransport {
    pub fn new(kind: TransportKind, candidates: Vec<PrinterCandidate>) -> Self {
        Self {
            kind,
            candidates,
            fail_with: None,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(
        kind: TransportKind,
        candidates: Vec<PrinterCandidate>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            candidates,
            fail_with: Some(message.into()),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Jobs delivered so far, as (target name, bytes) pairs
    pub async fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>> {
        Ok(self.candidates.clone())
    }

    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(PrintError::PrinterNotConnected(message.clone()));
        }
        self.deliveries
            .lock()
            .await
            .push((target.name.clone(), job.to_vec()));
        Ok(())
    }
}

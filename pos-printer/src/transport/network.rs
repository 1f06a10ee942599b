//! Network transport (raw TCP, port 9100)
//!
//! Most thermal printers accept raw ESC/POS bytes over TCP port 9100.
//! Network printers are not discoverable; the configured address is the
//! single candidate this backend contributes.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use super::Transport;
use crate::candidate::{PrinterAddress, PrinterCandidate, TransportKind};
use crate::error::{PrintError, PrintResult};

const ONLINE_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Raw TCP printer transport
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    name: String,
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkTransport {
    /// Create a transport for one configured printer address
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            timeout: Duration::from_secs(5),
        }
    }

    /// Create from an address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(name: impl Into<String>, addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;
        Ok(Self::new(name, addr))
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn target_addr(&self, target: &PrinterCandidate) -> PrintResult<SocketAddr> {
        match target.address {
            PrinterAddress::Network(addr) => Ok(addr),
            _ => Err(PrintError::InvalidConfig(format!(
                "network transport cannot address {}",
                target.address
            ))),
        }
    }
}

#[async_trait]
impl Transport for NetworkTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>> {
        Ok(vec![PrinterCandidate::network(
            self.name.clone(),
            self.addr,
        )])
    }

    #[instrument(skip(self, job), fields(addr = %self.addr, data_len = job.len()))]
    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()> {
        let addr = self.target_addr(target)?;

        info!("Connecting to printer");

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", addr, e)))?;

        info!("Connected, sending {} bytes", job.len());

        let mut stream = stream;
        stream.write_all(job).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;

        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self, target), fields(addr = %self.addr))]
    async fn is_online(&self, target: &PrinterCandidate) -> bool {
        let Ok(addr) = self.target_addr(target) else {
            return false;
        };

        match tokio::time::timeout(ONLINE_PROBE_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

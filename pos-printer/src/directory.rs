//! Printer directory
//!
//! Fans discovery out across the configured transports and resolves the
//! configured matcher against the combined candidate list. Every call
//! re-enumerates: printer presence is volatile and a stale hit is worse
//! than the cost of asking again.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::candidate::{PrinterCandidate, PrinterMatcher, TransportKind};
use crate::error::{PrintError, PrintResult};
use crate::transport::Transport;

/// Ordered collection of transports to discover through
pub struct PrinterDirectory {
    transports: Vec<Arc<dyn Transport>>,
}

impl PrinterDirectory {
    /// Create a directory over the given transports
    ///
    /// Discovery order follows the order of this list, and the matcher
    /// picks the first hit, so the caller's ordering is a priority.
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// Enumerate all candidates, in transport order
    ///
    /// A transport that fails to enumerate is skipped with a warning; one
    /// unplugged subsystem must not hide the others.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Vec<PrinterCandidate> {
        let mut result = Vec::new();
        for transport in &self.transports {
            match transport.discover().await {
                Ok(mut candidates) => result.append(&mut candidates),
                Err(e) => {
                    warn!(kind = %transport.kind(), error = %e, "Discovery failed, skipping transport");
                }
            }
        }
        result
    }

    /// Resolve the matcher to the first matching candidate
    pub async fn resolve(&self, matcher: &PrinterMatcher) -> PrintResult<PrinterCandidate> {
        self.discover()
            .await
            .into_iter()
            .find(|candidate| matcher.matches(candidate))
            .ok_or_else(|| PrintError::NoPrinterFound(matcher.to_string()))
    }

    /// The transport serving a given kind, if one is configured
    pub fn transport_for(&self, kind: TransportKind) -> Option<Arc<dyn Transport>> {
        self.transports
            .iter()
            .find(|transport| transport.kind() == kind)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn directory_with_two_sources() -> PrinterDirectory {
        let usb = MemoryTransport::new(
            TransportKind::Usb,
            vec![
                PrinterCandidate::usb("USB 0fe6:811e", 0x0FE6, 0x811E),
                PrinterCandidate::usb("USB 04b8:0202", 0x04B8, 0x0202),
            ],
        );
        let spooler = MemoryTransport::new(
            TransportKind::Spooler,
            vec![PrinterCandidate::spooler("TM-T20 Receipt", "TM-T20")],
        );
        let transports: Vec<Arc<dyn Transport>> = vec![Arc::new(usb), Arc::new(spooler)];
        PrinterDirectory::new(transports)
    }

    #[tokio::test]
    async fn test_discover_preserves_transport_order() {
        let directory = directory_with_two_sources();
        let candidates = directory.discover().await;
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["USB 0fe6:811e", "USB 04b8:0202", "TM-T20 Receipt"]
        );
    }

    #[tokio::test]
    async fn test_resolve_returns_first_match() {
        let directory = directory_with_two_sources();
        let matcher = PrinterMatcher::NameContains("usb".into());
        let candidate = directory.resolve(&matcher).await.unwrap();
        assert_eq!(candidate.name, "USB 0fe6:811e");
    }

    #[tokio::test]
    async fn test_resolve_not_found_is_deterministic() {
        let directory = directory_with_two_sources();
        let matcher = PrinterMatcher::NameContains("star".into());
        for _ in 0..3 {
            let err = directory.resolve(&matcher).await.unwrap_err();
            assert!(matches!(err, PrintError::NoPrinterFound(_)));
        }
    }

    #[tokio::test]
    async fn test_resolve_is_stable_across_repeated_calls() {
        // No caching drift: same matcher, same answer, every time
        let directory = directory_with_two_sources();
        let matcher = PrinterMatcher::UsbId { vid: 0x04B8, pid: 0x0202 };
        let first = directory.resolve(&matcher).await.unwrap();
        let second = directory.resolve(&matcher).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_transport_for_kind() {
        let directory = directory_with_two_sources();
        assert!(directory.transport_for(TransportKind::Usb).is_some());
        assert!(directory.transport_for(TransportKind::Network).is_none());
    }
}

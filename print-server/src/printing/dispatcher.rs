//! Print dispatcher
//!
//! The single entry point the HTTP layer talks to: validates and renders
//! the request, resolves a printer through the directory, and delivers the
//! bytes through the matching transport under a bounded timeout.
//!
//! There is deliberately no retry or failover here: silently redirecting a
//! receipt to a different physical printer is a worse failure than an
//! explicit error, so a failed delivery is reported as-is.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use pos_printer::{
    PrintError, PrinterCandidate, PrinterDirectory, PrinterMatcher, Transport, TransportKind,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::renderer::{ReceiptRenderer, ValidationError};
use super::types::{JobTicket, PrintRequest};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no printer matched: {0}")]
    NoPrinterFound(String),

    #[error("no transport configured for {0}")]
    TransportUnavailable(TransportKind),

    #[error("delivery timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error(transparent)]
    Delivery(#[from] PrintError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Printer selection and delivery configuration
///
/// Passed in explicitly at construction; dispatch logic reads no ambient
/// process state.
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    pub matcher: PrinterMatcher,
    pub delivery_timeout: Duration,
    pub paper_width: usize,
    pub timezone: Tz,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            matcher: PrinterMatcher::NameContains(String::new()),
            delivery_timeout: Duration::from_secs(10),
            paper_width: 48,
            timezone: chrono_tz::Europe::Madrid,
        }
    }
}

/// Print dispatcher - render, resolve, deliver
pub struct PrintDispatcher {
    config: PrinterConfig,
    renderer: ReceiptRenderer,
    directory: PrinterDirectory,
}

impl PrintDispatcher {
    /// Create a dispatcher over the given transports
    ///
    /// Transport order is discovery order, which the matcher treats as
    /// priority.
    pub fn new(config: PrinterConfig, transports: Vec<Arc<dyn Transport>>) -> Self {
        let renderer = ReceiptRenderer::new(config.paper_width, config.timezone);
        let directory = PrinterDirectory::new(transports);
        Self {
            config,
            renderer,
            directory,
        }
    }

    /// Submit one print job
    ///
    /// Validation errors are returned before any printer is touched.
    #[instrument(skip(self, request), fields(request = request.kind()))]
    pub async fn submit(&self, request: &PrintRequest) -> DispatchResult<JobTicket> {
        // Fail fast: render (and thereby validate) before any device I/O
        let job = self.renderer.render(request, Utc::now())?;

        let target = self.resolve_target().await?;

        let transport = self
            .directory
            .transport_for(target.kind)
            .ok_or(DispatchError::TransportUnavailable(target.kind))?;

        info!(printer = %target.name, bytes = job.approx_len, "Delivering print job");

        match tokio::time::timeout(
            self.config.delivery_timeout,
            transport.deliver(&job.bytes, &target),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(printer = %target.name, "Print job delivered");
                Ok(JobTicket {
                    printer: target.name,
                })
            }
            Ok(Err(e)) => {
                warn!(printer = %target.name, error = %e, "Delivery failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(printer = %target.name, "Delivery timed out");
                Err(DispatchError::Timeout(self.config.delivery_timeout))
            }
        }
    }

    /// Enumerate all currently visible printers (for the status API)
    pub async fn discover(&self) -> Vec<PrinterCandidate> {
        self.directory.discover().await
    }

    async fn resolve_target(&self) -> DispatchResult<PrinterCandidate> {
        self.directory
            .resolve(&self.config.matcher)
            .await
            .map_err(|e| match e {
                PrintError::NoPrinterFound(matcher) => DispatchError::NoPrinterFound(matcher),
                other => DispatchError::Delivery(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::types::{EventBody, EventData};
    use pos_printer::MemoryTransport;

    fn usb_candidate() -> PrinterCandidate {
        PrinterCandidate::usb("Thermal Receipt", 0x0FE6, 0x811E)
    }

    fn dispatcher_with(transport: Arc<MemoryTransport>) -> PrintDispatcher {
        let transports: Vec<Arc<dyn Transport>> = vec![transport];
        PrintDispatcher::new(
            PrinterConfig {
                matcher: PrinterMatcher::UsbId { vid: 0x0FE6, pid: 0x811E },
                delivery_timeout: Duration::from_millis(500),
                ..PrinterConfig::default()
            },
            transports,
        )
    }

    #[tokio::test]
    async fn test_submit_delivers_to_matched_printer() {
        let transport = Arc::new(MemoryTransport::new(
            TransportKind::Usb,
            vec![usb_candidate()],
        ));
        let dispatcher = dispatcher_with(transport.clone());

        let ticket = dispatcher.submit(&PrintRequest::RawTest).await.unwrap();
        assert_eq!(ticket.printer, "Thermal Receipt");

        let deliveries = transport.deliveries().await;
        assert_eq!(deliveries.len(), 1);
        assert!(!deliveries[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_no_matching_printer_reports_not_found() {
        // Candidate list is non-empty, but nothing matches the configured ids
        let other = PrinterCandidate::usb("Other Device", 0x1111, 0x2222);
        let transport = Arc::new(MemoryTransport::new(TransportKind::Usb, vec![other]));
        let dispatcher = dispatcher_with(transport.clone());

        let err = dispatcher.submit(&PrintRequest::RawTest).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoPrinterFound(_)));
        assert!(transport.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_short_circuits_before_delivery() {
        let transport = Arc::new(MemoryTransport::new(
            TransportKind::Usb,
            vec![usb_candidate()],
        ));
        let dispatcher = dispatcher_with(transport.clone());

        let request = PrintRequest::OrderPaid(EventBody {
            business_id: String::new(),
            order_id: "abc123456".to_string(),
            data: EventData::default(),
        });

        let err = dispatcher.submit(&request).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        // No transport call was attempted
        assert!(transport.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_surfaced_not_retried() {
        let transport = Arc::new(MemoryTransport::failing(
            TransportKind::Usb,
            vec![usb_candidate()],
            "cable unplugged",
        ));
        let dispatcher = dispatcher_with(transport.clone());

        let err = dispatcher.submit(&PrintRequest::RawTest).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Delivery(PrintError::PrinterNotConnected(m)) if m == "cable unplugged"
        ));
    }
}

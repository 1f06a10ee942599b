//! Server state
//!
//! Holds shared references to the configuration and the dispatcher. Cloned
//! into every handler; `Arc` keeps the copies cheap.

use std::sync::Arc;

use pos_printer::{
    NetworkTransport, QueueTransport, SpoolerTransport, Transport, TransportKind, UsbTransport,
};
use tracing::{info, warn};

use crate::core::Config;
use crate::printing::{PrintDispatcher, PrinterConfig};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<PrintDispatcher>,
}

impl ServerState {
    /// Build the state from configuration, wiring up the configured
    /// transports in priority order
    pub fn initialize(config: &Config) -> Self {
        let mut transports: Vec<Arc<dyn Transport>> = Vec::new();

        for kind in &config.transports {
            match kind {
                TransportKind::Usb => {
                    transports.push(Arc::new(
                        UsbTransport::new().with_timeout(config.delivery_timeout),
                    ));
                }
                TransportKind::Spooler => {
                    transports.push(Arc::new(SpoolerTransport::new()));
                }
                TransportKind::Queue => {
                    transports.push(Arc::new(QueueTransport::new()));
                }
                TransportKind::Network => match config.network_printer_addr {
                    Some(addr) => {
                        transports.push(Arc::new(
                            NetworkTransport::new("network", addr)
                                .with_timeout(config.delivery_timeout),
                        ));
                    }
                    None => {
                        warn!("Network transport enabled without NETWORK_PRINTER_ADDR, skipping");
                    }
                },
            }
        }

        info!(
            transports = %config
                .transports
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(","),
            matcher = %config.matcher,
            "Printer transports configured"
        );

        let dispatcher = PrintDispatcher::new(
            PrinterConfig {
                matcher: config.matcher.clone(),
                delivery_timeout: config.delivery_timeout,
                paper_width: config.paper_width,
                timezone: config.timezone,
            },
            transports,
        );

        Self {
            config: Arc::new(config.clone()),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Build the state around an existing dispatcher (tests inject a
    /// memory-transport dispatcher here)
    pub fn with_dispatcher(config: Config, dispatcher: PrintDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

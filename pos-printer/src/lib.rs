//! # pos-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - GB18030 encoding for receipt printers
//! - Transport backends: direct USB, OS spooler, driver queue, raw TCP
//! - Printer discovery and matcher resolution
//!
//! Business logic (WHAT to print) stays in application code: receipt
//! templates live in the print server, not here.
//!
//! ## Example
//!
//! ```ignore
//! use pos_printer::{EscPosBuilder, NetworkTransport, PrinterMatcher, Transport};
//!
//! // Build ESC/POS content
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.double_size();
//! builder.line("ORDER RECEIPT");
//! builder.reset_size();
//! builder.sep_double();
//! builder.left();
//! builder.line("2x Beer");
//! builder.feed(5);
//! builder.cut();
//!
//! // Send to a network printer
//! let transport = NetworkTransport::from_addr("bar", "192.168.1.100:9100")?;
//! let target = transport.discover().await?.remove(0);
//! transport.deliver(&builder.build(), &target).await?;
//! ```

pub mod command;

mod candidate;
mod directory;
mod encoding;
mod error;
mod escpos;
mod transport;

// Re-exports
pub use candidate::{PrinterAddress, PrinterCandidate, PrinterMatcher, TransportKind};
pub use directory::PrinterDirectory;
pub use encoding::{convert_to_gb18030, encoded_width, pad_width, sanitize, truncate_width};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use transport::{
    MemoryTransport, NetworkTransport, QueueTransport, SpoolerTransport, Transport, UsbTransport,
};

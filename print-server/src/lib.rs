//! Print bridge server - local HTTP front for ESC/POS receipt printers
//!
//! # Architecture
//!
//! ```text
//! print-server/src/
//! ├── core/      # configuration, state, HTTP bootstrap
//! ├── api/       # routes and handlers (/print, /status, /health)
//! ├── printing/  # wire types, receipt renderer, dispatcher
//! └── utils/     # error taxonomy, logging
//! ```
//!
//! The flow of one request: `POST /print` → [`printing::PrintDispatcher`]
//! renders the request into ESC/POS bytes, resolves a printer through
//! `pos-printer`'s directory, and delivers under a bounded timeout. The
//! server holds no state between requests; a failed job is the caller's to
//! resubmit.

pub mod api;
pub mod core;
pub mod printing;
pub mod utils;

// Re-export common types
pub use self::core::{Config, Server, ServerState};
pub use printing::{PrintDispatcher, PrintRequest, PrinterConfig};
pub use utils::{AppError, AppResult};

//! Receipt rendering and printer dispatch
//!
//! This module turns validated print requests into ESC/POS byte streams
//! and routes them to a physical printer:
//! - [`types`]: wire types for `POST /print`
//! - [`renderer`]: request -> bytes, pure and deterministic
//! - [`dispatcher`]: render -> resolve -> deliver, with the error taxonomy

pub mod dispatcher;
pub mod renderer;
pub mod types;

pub use dispatcher::{DispatchError, DispatchResult, PrintDispatcher, PrinterConfig};
pub use renderer::{ReceiptRenderer, ValidationError};
pub use types::{JobTicket, PrintRequest, RenderedJob};

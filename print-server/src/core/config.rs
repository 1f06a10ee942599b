//! Server configuration
//!
//! All configuration comes from environment variables, loaded once at
//! startup (after `dotenv`). Nothing below the HTTP layer reads the
//! environment; the dispatcher gets an explicit config struct.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | HTTP_PORT | 3000 | HTTP listen port (localhost only) |
//! | API_KEY | (unset) | Shared secret for `POST /print`; unset rejects all prints |
//! | PRINTER_MATCH | (any) | `vid=0x…,pid=0x…` or a name substring |
//! | PRINTER_VID / PRINTER_PID | (unset) | Hex USB id pair, used when PRINTER_MATCH is unset |
//! | PRINTER_TRANSPORTS | usb | Comma list: usb, spooler, queue, network |
//! | NETWORK_PRINTER_ADDR | (unset) | `host:port` for the network transport |
//! | PRINT_TIMEOUT_MS | 10000 | Per-delivery timeout |
//! | PAPER_WIDTH | 48 | Paper width in characters (32 for 58mm) |
//! | TIMEZONE | Europe/Madrid | Receipt timestamp timezone |
//! | LOG_LEVEL | info | Fallback tracing filter (read at startup, before config) |

use std::net::SocketAddr;
use std::time::Duration;

use chrono_tz::Tz;
use pos_printer::{PrinterMatcher, TransportKind};
use tracing::warn;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API service port
    pub http_port: u16,
    /// Shared secret required by `POST /print`
    pub api_key: String,
    /// Printer selection policy
    pub matcher: PrinterMatcher,
    /// Enabled transports, in discovery-priority order
    pub transports: Vec<TransportKind>,
    /// Address of the network printer, if the network transport is enabled
    pub network_printer_addr: Option<SocketAddr>,
    /// Bound on a single delivery attempt
    pub delivery_timeout: Duration,
    /// Paper width in characters
    pub paper_width: usize,
    /// Timezone receipts are stamped in
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults; unparseable values fall back
    /// with a warning rather than aborting startup.
    pub fn from_env() -> Self {
        Self {
            http_port: env_parsed("HTTP_PORT").unwrap_or(3000),
            api_key: std::env::var("API_KEY").unwrap_or_default(),
            matcher: matcher_from_env(),
            transports: transports_from_env(),
            network_printer_addr: env_parsed("NETWORK_PRINTER_ADDR"),
            delivery_timeout: Duration::from_millis(
                env_parsed("PRINT_TIMEOUT_MS").unwrap_or(10_000),
            ),
            paper_width: env_parsed("PAPER_WIDTH").unwrap_or(48),
            timezone: env_parsed("TIMEZONE").unwrap_or(chrono_tz::Europe::Madrid),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Unparseable environment value, using default");
            None
        }
    }
}

/// Matcher precedence: PRINTER_MATCH, then PRINTER_VID/PRINTER_PID,
/// then "first discovered printer"
fn matcher_from_env() -> PrinterMatcher {
    if let Some(matcher) = env_parsed::<PrinterMatcher>("PRINTER_MATCH") {
        return matcher;
    }

    let vid = std::env::var("PRINTER_VID").ok();
    let pid = std::env::var("PRINTER_PID").ok();
    if let (Some(vid), Some(pid)) = (vid, pid) {
        match format!("vid={},pid={}", vid, pid).parse() {
            Ok(matcher) => return matcher,
            Err(e) => warn!(error = %e, "Bad PRINTER_VID/PRINTER_PID pair, ignoring"),
        }
    }

    PrinterMatcher::NameContains(String::new())
}

fn transports_from_env() -> Vec<TransportKind> {
    let raw = match std::env::var("PRINTER_TRANSPORTS") {
        Ok(raw) => raw,
        Err(_) => return vec![TransportKind::Usb],
    };

    let mut kinds = Vec::new();
    for part in raw.split(',') {
        match part.parse::<TransportKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unknown transport in PRINTER_TRANSPORTS"),
        }
    }

    if kinds.is_empty() {
        warn!("PRINTER_TRANSPORTS selected nothing usable, falling back to usb");
        kinds.push(TransportKind::Usb);
    }
    kinds
}

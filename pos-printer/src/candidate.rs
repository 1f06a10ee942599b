//! Printer candidates and matchers
//!
//! A candidate is a discovered, not-yet-selected printer target with its
//! transport-specific addressing information. Candidates are discovered
//! fresh on every dispatch — printer presence is volatile (USB hot-plug,
//! spooler service cycling), so nothing here is ever cached.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PrintError;

/// Transport families a candidate can be reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Usb,
    Spooler,
    Queue,
    Network,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Usb => "usb",
            TransportKind::Spooler => "spooler",
            TransportKind::Queue => "queue",
            TransportKind::Network => "network",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TransportKind {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usb" => Ok(TransportKind::Usb),
            "spooler" => Ok(TransportKind::Spooler),
            "queue" => Ok(TransportKind::Queue),
            "network" => Ok(TransportKind::Network),
            other => Err(PrintError::InvalidConfig(format!(
                "unknown transport kind: {}",
                other
            ))),
        }
    }
}

/// Transport-specific printer address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrinterAddress {
    /// USB vendor/product id pair
    Usb { vid: u16, pid: u16 },
    /// OS-registered queue name (spooler or driver queue)
    Queue(String),
    /// Raw TCP endpoint (port 9100)
    Network(SocketAddr),
}

impl fmt::Display for PrinterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterAddress::Usb { vid, pid } => write!(f, "{:04x}:{:04x}", vid, pid),
            PrinterAddress::Queue(name) => write!(f, "{}", name),
            PrinterAddress::Network(addr) => write!(f, "{}", addr),
        }
    }
}

/// A discovered printer target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterCandidate {
    pub name: String,
    pub kind: TransportKind,
    pub address: PrinterAddress,
}

impl PrinterCandidate {
    pub fn usb(name: impl Into<String>, vid: u16, pid: u16) -> Self {
        Self {
            name: name.into(),
            kind: TransportKind::Usb,
            address: PrinterAddress::Usb { vid, pid },
        }
    }

    pub fn spooler(name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TransportKind::Spooler,
            address: PrinterAddress::Queue(queue.into()),
        }
    }

    pub fn queue(name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TransportKind::Queue,
            address: PrinterAddress::Queue(queue.into()),
        }
    }

    pub fn network(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            kind: TransportKind::Network,
            address: PrinterAddress::Network(addr),
        }
    }
}

/// Selection policy applied against the discovery list
///
/// The first candidate matching in discovery order wins. There is no
/// persistent binding: the matcher is re-applied on every dispatch, so a
/// replaced or reconnected printer is picked up without restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterMatcher {
    /// Case-insensitive substring match against the candidate name.
    /// An empty substring matches every candidate (first discovered wins).
    NameContains(String),
    /// Exact USB vendor/product id pair
    UsbId { vid: u16, pid: u16 },
}

impl PrinterMatcher {
    pub fn matches(&self, candidate: &PrinterCandidate) -> bool {
        match self {
            PrinterMatcher::NameContains(needle) => candidate
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            PrinterMatcher::UsbId { vid, pid } => {
                candidate.address == PrinterAddress::Usb { vid: *vid, pid: *pid }
            }
        }
    }
}

impl fmt::Display for PrinterMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterMatcher::NameContains(s) if s.is_empty() => write!(f, "any printer"),
            PrinterMatcher::NameContains(s) => write!(f, "name contains {:?}", s),
            PrinterMatcher::UsbId { vid, pid } => {
                write!(f, "vid=0x{:04X},pid=0x{:04X}", vid, pid)
            }
        }
    }
}

impl FromStr for PrinterMatcher {
    type Err = PrintError;

    /// Parse the config syntax: `vid=0x0FE6,pid=0x811E` selects by USB id,
    /// anything else is a name substring.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.to_lowercase().contains("vid=") {
            return Ok(PrinterMatcher::NameContains(s.to_string()));
        }

        let mut vid = None;
        let mut pid = None;
        for part in s.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| PrintError::InvalidConfig(format!("bad matcher segment: {}", part)))?;
            let parsed = parse_hex_u16(value.trim())?;
            match key.trim().to_lowercase().as_str() {
                "vid" => vid = Some(parsed),
                "pid" => pid = Some(parsed),
                other => {
                    return Err(PrintError::InvalidConfig(format!(
                        "unknown matcher key: {}",
                        other
                    )));
                }
            }
        }

        match (vid, pid) {
            (Some(vid), Some(pid)) => Ok(PrinterMatcher::UsbId { vid, pid }),
            _ => Err(PrintError::InvalidConfig(
                "USB matcher needs both vid= and pid=".to_string(),
            )),
        }
    }
}

fn parse_hex_u16(s: &str) -> Result<u16, PrintError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16)
        .map_err(|_| PrintError::InvalidConfig(format!("bad hex id: {}", s)))
}

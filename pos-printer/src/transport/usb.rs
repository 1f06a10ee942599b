//! USB transport (direct libusb access)
//!
//! Opens the device by vendor/product id, claims the printer interface and
//! writes to its bulk OUT endpoint. Opening the same device twice
//! concurrently is undefined behaviour on most firmwares, so deliveries to
//! one vid/pid pair are serialized through a per-device async mutex.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rusb::{ConfigDescriptor, Direction, GlobalContext, TransferType};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::Transport;
use crate::candidate::{PrinterAddress, PrinterCandidate, TransportKind};
use crate::error::{PrintError, PrintResult};

/// USB printer interface class code
const USB_CLASS_PRINTER: u8 = 0x07;

/// Direct USB printer transport
pub struct UsbTransport {
    io_timeout: Duration,
    locks: DashMap<(u16, u16), Arc<Mutex<()>>>,
}

impl UsbTransport {
    pub fn new() -> Self {
        Self {
            io_timeout: Duration::from_secs(5),
            locks: DashMap::new(),
        }
    }

    /// Set the bulk-write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Exclusive-access lock for one physical device
    fn device_lock(&self, vid: u16, pid: u16) -> Arc<Mutex<()>> {
        self.locks
            .entry((vid, pid))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn target_ids(target: &PrinterCandidate) -> PrintResult<(u16, u16)> {
        match target.address {
            PrinterAddress::Usb { vid, pid } => Ok((vid, pid)),
            _ => Err(PrintError::InvalidConfig(format!(
                "USB transport cannot address {}",
                target.address
            ))),
        }
    }
}

impl Default for UsbTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UsbTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Usb
    }

    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>> {
        tokio::task::spawn_blocking(list_printer_devices)
            .await
            .map_err(|e| PrintError::DeviceOpen(format!("Task join failed: {}", e)))?
    }

    #[instrument(skip(self, job), fields(printer = %target.name, data_len = job.len()))]
    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()> {
        let (vid, pid) = Self::target_ids(target)?;

        // Hold the device exclusively for the whole delivery; a second
        // concurrent request to the same printer waits here.
        let lock = self.device_lock(vid, pid);
        let _guard = lock.lock().await;

        let data = job.to_vec();
        let timeout = self.io_timeout;

        info!("Writing to USB device");
        tokio::task::spawn_blocking(move || write_to_device(vid, pid, &data, timeout))
            .await
            .map_err(|e| PrintError::DeviceOpen(format!("Task join failed: {}", e)))?
    }

    async fn is_online(&self, target: &PrinterCandidate) -> bool {
        let Ok((vid, pid)) = Self::target_ids(target) else {
            return false;
        };
        tokio::task::spawn_blocking(move || {
            rusb::open_device_with_vid_pid(vid, pid).is_some()
        })
        .await
        .unwrap_or(false)
    }
}

/// Enumerate connected devices that expose a printer-class interface
fn list_printer_devices() -> PrintResult<Vec<PrinterCandidate>> {
    let devices = rusb::devices()
        .map_err(|e| PrintError::DeviceOpen(format!("USB enumeration failed: {}", e)))?;

    let mut result = Vec::new();
    for device in devices.iter() {
        let Ok(descriptor) = device.device_descriptor() else {
            continue;
        };
        let Ok(config) = device.active_config_descriptor() else {
            continue;
        };
        if find_bulk_out(&config).is_none() {
            continue;
        }

        let vid = descriptor.vendor_id();
        let pid = descriptor.product_id();

        // Product string needs an open handle and may be unreadable
        // without permissions; fall back to the id pair.
        let name = device
            .open()
            .ok()
            .and_then(|handle| handle.read_product_string_ascii(&descriptor).ok())
            .unwrap_or_else(|| format!("USB {:04x}:{:04x}", vid, pid));

        result.push(PrinterCandidate::usb(name, vid, pid));
    }

    Ok(result)
}

/// Locate a bulk OUT endpoint on a printer-class interface
fn find_bulk_out(config: &ConfigDescriptor) -> Option<(u8, u8)> {
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            if descriptor.class_code() != USB_CLASS_PRINTER {
                continue;
            }
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.direction() == Direction::Out
                    && endpoint.transfer_type() == TransferType::Bulk
                {
                    return Some((descriptor.interface_number(), endpoint.address()));
                }
            }
        }
    }
    None
}

/// Open, claim, write, release - blocking; run under `spawn_blocking`
fn write_to_device(vid: u16, pid: u16, data: &[u8], timeout: Duration) -> PrintResult<()> {
    let mut handle: rusb::DeviceHandle<GlobalContext> = rusb::open_device_with_vid_pid(vid, pid)
        .ok_or_else(|| {
            PrintError::DeviceOpen(format!("No USB device {:04x}:{:04x}", vid, pid))
        })?;

    let config = handle
        .device()
        .active_config_descriptor()
        .map_err(|e| PrintError::DeviceOpen(format!("Config descriptor: {}", e)))?;

    let (interface, endpoint) = find_bulk_out(&config).ok_or_else(|| {
        PrintError::DeviceOpen(format!(
            "No printer bulk OUT endpoint on {:04x}:{:04x}",
            vid, pid
        ))
    })?;

    if handle.kernel_driver_active(interface).unwrap_or(false)
        && let Err(e) = handle.detach_kernel_driver(interface)
    {
        warn!(error = %e, "Kernel driver detach failed");
    }

    handle
        .claim_interface(interface)
        .map_err(|e| PrintError::DeviceOpen(format!("Claim interface: {}", e)))?;

    let result = write_all_bulk(&handle, endpoint, data, timeout);

    if let Err(e) = handle.release_interface(interface) {
        warn!(error = %e, "Release interface failed");
    }

    result
}

fn write_all_bulk(
    handle: &rusb::DeviceHandle<GlobalContext>,
    endpoint: u8,
    data: &[u8],
    timeout: Duration,
) -> PrintResult<()> {
    let mut written = 0;
    while written < data.len() {
        match handle.write_bulk(endpoint, &data[written..], timeout) {
            Ok(n) => written += n,
            Err(rusb::Error::Timeout) => {
                return Err(PrintError::Timeout(format!(
                    "USB write stalled after {} of {} bytes",
                    written,
                    data.len()
                )));
            }
            Err(e) => {
                return Err(PrintError::Io(std::io::Error::other(format!(
                    "USB write failed: {}",
                    e
                ))));
            }
        }
    }
    Ok(())
}

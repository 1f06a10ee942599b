//! Named-queue transport (driver-based printing)
//!
//! Talks to an installed printer driver through the OS spooler API: opens a
//! printer handle by queue name, runs a pre-flight connectivity check and
//! writes the job as one RAW document batch. Only available on Windows;
//! other platforms get a stub that reports the backend as unavailable.

use async_trait::async_trait;

use super::Transport;
use crate::candidate::{PrinterAddress, PrinterCandidate, TransportKind};
use crate::error::{PrintError, PrintResult};

/// Driver-queue printer transport
#[derive(Debug, Default)]
pub struct QueueTransport;

impl QueueTransport {
    pub fn new() -> Self {
        Self
    }

    fn target_queue<'a>(target: &'a PrinterCandidate) -> PrintResult<&'a str> {
        match &target.address {
            PrinterAddress::Queue(queue) => Ok(queue),
            _ => Err(PrintError::InvalidConfig(format!(
                "queue transport cannot address {}",
                target.address
            ))),
        }
    }
}

#[async_trait]
impl Transport for QueueTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Queue
    }

    async fn discover(&self) -> PrintResult<Vec<PrinterCandidate>> {
        tokio::task::spawn_blocking(platform::list_queues)
            .await
            .map_err(|e| PrintError::PrinterNotConnected(format!("Task join failed: {}", e)))?
    }

    async fn deliver(&self, job: &[u8], target: &PrinterCandidate) -> PrintResult<()> {
        let queue = Self::target_queue(target)?.to_string();
        let data = job.to_vec();

        tokio::task::spawn_blocking(move || platform::write_raw(&queue, &data))
            .await
            .map_err(|e| PrintError::PrinterNotConnected(format!("Task join failed: {}", e)))?
    }

    async fn is_online(&self, target: &PrinterCandidate) -> bool {
        let Ok(queue) = Self::target_queue(target) else {
            return false;
        };
        let queue = queue.to_string();
        tokio::task::spawn_blocking(move || platform::check_online(&queue).unwrap_or(false))
            .await
            .unwrap_or(false)
    }
}

#[cfg(windows)]
mod platform {
    use tracing::warn;
    use windows::Win32::Graphics::Printing::{
        ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, GetPrinterW,
        OpenPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE,
        PRINTER_INFO_5W, PRINTER_INFO_6, PRINTER_STATUS_OFFLINE, StartDocPrinterW,
        StartPagePrinter, WritePrinter,
    };
    use windows::core::{PCWSTR, PWSTR};

    use crate::candidate::PrinterCandidate;
    use crate::error::{PrintError, PrintResult};

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Check if a port belongs to a virtual printer
    fn is_virtual_port(port: &str) -> bool {
        let p = port.to_lowercase();
        p == "file:"
            || p == "portprompt:"
            || p == "xpsport:"
            || p.starts_with("onenote")
            || p == "nul:"
            || p.starts_with("wfsport:")
    }

    /// Enumerate installed driver queues (virtual printers filtered out)
    pub fn list_queues() -> PrintResult<Vec<PrinterCandidate>> {
        unsafe {
            let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
            let mut needed: u32 = 0;
            let mut returned: u32 = 0;

            let _ = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned);

            if needed == 0 {
                return Ok(Vec::new());
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            EnumPrintersW(
                flags,
                None,
                5,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
            .map_err(|_| {
                PrintError::PrinterNotConnected("EnumPrintersW failed".to_string())
            })?;

            let ptr = buf.as_ptr() as *const PRINTER_INFO_5W;
            let slice = std::slice::from_raw_parts(ptr, returned as usize);

            let mut result = Vec::new();
            for info in slice.iter() {
                if info.pPrinterName.is_null() {
                    continue;
                }
                let name = PWSTR(info.pPrinterName.0).to_string().unwrap_or_default();

                let port = if info.pPortName.is_null() {
                    String::new()
                } else {
                    PWSTR(info.pPortName.0).to_string().unwrap_or_default()
                };

                if !is_virtual_port(&port) {
                    result.push(PrinterCandidate::queue(name.clone(), name));
                }
            }

            Ok(result)
        }
    }

    /// Pre-flight connectivity check for a driver queue
    ///
    /// Consults the spooler status word; for IP-mapped ports, probes the
    /// raw printing port directly.
    pub fn check_online(queue: &str) -> PrintResult<bool> {
        use std::net::{TcpStream, ToSocketAddrs};
        use std::time::Duration;

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            let name_w = to_wide(queue);

            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None).map_err(|_| {
                PrintError::PrinterNotConnected(format!("OpenPrinterW failed: {}", queue))
            })?;

            let _closer = HandleGuard(handle);

            // PRINTER_INFO_6 carries the status word
            let mut needed6: u32 = 0;
            let _ = GetPrinterW(handle, 6, None, &mut needed6);

            if needed6 > 0 {
                let mut buf6: Vec<u8> = vec![0; needed6 as usize];
                if GetPrinterW(handle, 6, Some(buf6.as_mut_slice()), &mut needed6).is_ok() {
                    let info6 = *(buf6.as_ptr() as *const PRINTER_INFO_6);
                    if (info6.dwStatus & PRINTER_STATUS_OFFLINE) != 0 {
                        return Ok(false);
                    }
                }
            }

            // PRINTER_INFO_5 carries the port name
            let mut needed5: u32 = 0;
            let _ = GetPrinterW(handle, 5, None, &mut needed5);

            let port = if needed5 > 0 {
                let mut buf5: Vec<u8> = vec![0; needed5 as usize];
                if GetPrinterW(handle, 5, Some(buf5.as_mut_slice()), &mut needed5).is_ok() {
                    let info5 = *(buf5.as_ptr() as *const PRINTER_INFO_5W);
                    if !info5.pPortName.is_null() {
                        PWSTR(info5.pPortName.0).to_string().unwrap_or_default()
                    } else {
                        String::new()
                    }
                } else {
                    String::new()
                }
            } else {
                String::new()
            };

            // IP-mapped ports (IP_x.x.x.x): probe the raw port
            let lower = port.to_lowercase();
            if lower.starts_with("ip_") {
                let host = lower.trim_start_matches("ip_");
                let host = host.split(',').next().unwrap_or(host);

                let timeout = Duration::from_millis(400);
                if let Ok(mut iter) = format!("{}:9100", host).to_socket_addrs()
                    && let Some(addr) = iter.next()
                {
                    return Ok(TcpStream::connect_timeout(&addr, timeout).is_ok());
                }
                return Ok(false);
            }

            // Non-IP queues: online unless the spooler says otherwise
            Ok(true)
        }
    }

    /// Closes the printer handle on drop
    struct HandleGuard(PRINTER_HANDLE);

    impl Drop for HandleGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = ClosePrinter(self.0);
            }
        }
    }

    /// An open RAW document on a printer handle
    ///
    /// Ends the page, ends the document and closes the handle on drop, so
    /// no exit path can leak the spooler handle.
    struct RawDocument {
        handle: PRINTER_HANDLE,
        page_open: bool,
    }

    impl RawDocument {
        fn open(queue: &str) -> PrintResult<Self> {
            unsafe {
                let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
                let name_w = to_wide(queue);

                OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None).map_err(
                    |_| {
                        PrintError::PrinterNotConnected(format!(
                            "OpenPrinterW failed: {}",
                            queue
                        ))
                    },
                )?;

                let mut doc = Self {
                    handle,
                    page_open: false,
                };

                let doc_name_w = to_wide("Receipt");
                let datatype_w = to_wide("RAW");
                let doc_info = DOC_INFO_1W {
                    pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                    pOutputFile: PWSTR::null(),
                    pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
                };

                if StartDocPrinterW(doc.handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                    // doc drop closes the handle
                    return Err(PrintError::PrinterNotConnected(
                        "StartDocPrinter failed".to_string(),
                    ));
                }

                if !StartPagePrinter(doc.handle).as_bool() {
                    let _ = EndDocPrinter(doc.handle);
                    return Err(PrintError::PrinterNotConnected(
                        "StartPagePrinter failed".to_string(),
                    ));
                }
                doc.page_open = true;

                Ok(doc)
            }
        }

        fn write(&mut self, data: &[u8]) -> PrintResult<()> {
            use core::ffi::c_void;

            unsafe {
                let mut written: u32 = 0;
                let ok = WritePrinter(
                    self.handle,
                    data.as_ptr() as *const c_void,
                    data.len() as u32,
                    &mut written,
                );

                if !ok.as_bool() {
                    return Err(PrintError::PrinterNotConnected(
                        "WritePrinter failed".to_string(),
                    ));
                }

                if written != data.len() as u32 {
                    return Err(PrintError::PrinterNotConnected(
                        "Incomplete write".to_string(),
                    ));
                }

                Ok(())
            }
        }
    }

    impl Drop for RawDocument {
        fn drop(&mut self) {
            unsafe {
                if self.page_open {
                    let _ = EndPagePrinter(self.handle);
                    let _ = EndDocPrinter(self.handle);
                }
                let _ = ClosePrinter(self.handle);
            }
        }
    }

    /// Write a job through the driver as one RAW batch
    pub fn write_raw(queue: &str, data: &[u8]) -> PrintResult<()> {
        // Pre-flight: do not start a document against a dead queue
        match check_online(queue) {
            Ok(false) => {
                return Err(PrintError::PrinterNotConnected(format!(
                    "printer offline: {}",
                    queue
                )));
            }
            Err(e) => {
                warn!(error = %e, "Pre-flight check failed, attempting write anyway");
            }
            Ok(true) => {}
        }

        let mut doc = RawDocument::open(queue)?;
        doc.write(data)
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::candidate::PrinterCandidate;
    use crate::error::{PrintError, PrintResult};

    pub fn list_queues() -> PrintResult<Vec<PrinterCandidate>> {
        Ok(Vec::new())
    }

    pub fn check_online(_queue: &str) -> PrintResult<bool> {
        Ok(false)
    }

    pub fn write_raw(_queue: &str, _data: &[u8]) -> PrintResult<()> {
        Err(PrintError::PrinterNotConnected(
            "driver printing not supported on this platform".to_string(),
        ))
    }
}

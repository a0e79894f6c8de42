use super::{Transport, TransportError, TransportHandle};
use crate::config::DriverConfig;
use bytes::Bytes;
use nusb::Interface;
use nusb::transfer::{RequestBuffer, TransferError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// HID transport over raw interrupt endpoints, without a kernel HID driver.
#[derive(Debug, Clone)]
pub struct UsbHidTransport {
    interface: u8,
    endpoint_in: u8,
    endpoint_out: u8,
    report_size: usize,
}

impl UsbHidTransport {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            interface: config.interface,
            endpoint_in: config.endpoint_in,
            endpoint_out: config.endpoint_out,
            report_size: config.report_size,
        }
    }
}

impl Default for UsbHidTransport {
    fn default() -> Self {
        Self::new(&DriverConfig::default())
    }
}

fn open_error(err: std::io::Error) -> TransportError {
    TransportError::Open(err.to_string())
}

/// A stall or a cancelled transfer leaves the endpoint usable.
fn is_fatal(err: &TransferError) -> bool {
    !matches!(err, TransferError::Stall | TransferError::Cancelled)
}

impl Transport for UsbHidTransport {
    type Handle = UsbHidHandle;

    async fn open(&self, vendor_id: u16, product_id: u16) -> Result<UsbHidHandle, TransportError> {
        info!("Searching for device {vendor_id:04x}:{product_id:04x}...");
        let device_info = nusb::list_devices()
            .map_err(open_error)?
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or(TransportError::NotFound {
                vendor_id,
                product_id,
            })?;

        info!(
            "Found device on bus {} addr {}",
            device_info.bus_number(),
            device_info.device_address()
        );

        let device = device_info.open().map_err(open_error)?;
        let interface = device
            .detach_and_claim_interface(self.interface)
            .map_err(open_error)?;
        info!("Interface {} claimed", self.interface);

        Ok(UsbHidHandle {
            interface,
            endpoint_in: self.endpoint_in,
            endpoint_out: self.endpoint_out,
            report_size: self.report_size,
            closed: AtomicBool::new(false),
        })
    }
}

pub struct UsbHidHandle {
    interface: Interface,
    endpoint_in: u8,
    endpoint_out: u8,
    report_size: usize,
    closed: AtomicBool,
}

impl UsbHidHandle {
    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    async fn write_report(&self, report: Vec<u8>) -> Result<(), TransportError> {
        let completion = timeout(WRITE_TIMEOUT, self.interface.interrupt_out(self.endpoint_out, report))
            .await
            .map_err(|_| TransportError::Write {
                message: "timed out".to_string(),
                fatal: false,
            })?;
        completion.into_result().map_err(|err| TransportError::Write {
            message: err.to_string(),
            fatal: is_fatal(&err),
        })?;
        Ok(())
    }
}

impl TransportHandle for UsbHidHandle {
    /// Every report is zero-padded to the full report size.
    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.check_open()?;
        for chunk in data.chunks(self.report_size) {
            let mut report = vec![0u8; self.report_size];
            report[..chunk.len()].copy_from_slice(chunk);
            self.write_report(report).await?;
        }
        debug!("Sent {} bytes", data.len());
        Ok(())
    }

    async fn read(&self) -> Result<Bytes, TransportError> {
        self.check_open()?;
        let completion = self
            .interface
            .interrupt_in(self.endpoint_in, RequestBuffer::new(self.report_size))
            .await;
        match completion.into_result() {
            Ok(data) => Ok(Bytes::from(data)),
            Err(_) if self.closed.load(Ordering::Acquire) => Err(TransportError::Closed),
            Err(err) => Err(TransportError::Read {
                message: err.to_string(),
                fatal: is_fatal(&err),
            }),
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("USB link closed");
        }
    }
}

//! Byte-stream transport consumed by the device layer.

pub mod mock;
pub mod usb;

pub use usb::UsbHidTransport;

use bytes::Bytes;
use std::future::Future;
use thiserror::Error;

/// Transport-level failures. Cloneable so they can travel in lifecycle events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No device with VID {vendor_id:#06x} PID {product_id:#06x} found")]
    NotFound { vendor_id: u16, product_id: u16 },

    #[error("Failed to open device: {0}")]
    Open(String),

    #[error("Write failed: {message}")]
    Write { message: String, fatal: bool },

    #[error("Read failed: {message}")]
    Read { message: String, fatal: bool },

    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Whether the link is unusable and must be reopened.
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::Write { fatal, .. } | TransportError::Read { fatal, .. } => *fatal,
            TransportError::NotFound { .. } | TransportError::Open(_) | TransportError::Closed => true,
        }
    }
}

/// Opens links to a device.
pub trait Transport: Send + Sync + 'static {
    type Handle: TransportHandle;

    fn open(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> impl Future<Output = Result<Self::Handle, TransportError>> + Send;
}

/// An open link. All methods take `&self` so reads and writes can run
/// concurrently from different tasks.
pub trait TransportHandle: Send + Sync + 'static {
    /// Send `data`, split into as many reports as needed.
    fn write(&self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next inbound chunk.
    fn read(&self) -> impl Future<Output = Result<Bytes, TransportError>> + Send;

    fn close(&self) -> impl Future<Output = ()> + Send;
}

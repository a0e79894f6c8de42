use crate::transport::TransportError;
use thiserror::Error;

/// The primary error type for the `arcticfox-lib` library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FoxError {
    #[error("Failed to open device: {0}")]
    TransportOpen(#[source] TransportError),

    #[error("Failed to write to device: {0}")]
    TransportWrite(#[source] TransportError),

    #[error("No complete response within the deadline")]
    RequestTimeout,

    #[error("Settings version {settings_version} is newer than supported version {supported}; update the tool")]
    OutdatedTool { settings_version: u8, supported: u8 },

    #[error(
        "Firmware build {build} (settings v{settings_version}) is older than the supported build {minimum} (settings v{supported}); update the firmware"
    )]
    OutdatedFirmware {
        build: u32,
        minimum: u32,
        settings_version: u8,
        supported: u8,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid command frame: {0}")]
    InvalidFrame(String),

    #[error("Another request is already outstanding")]
    Busy,

    #[error("Device is not connected")]
    NotConnected,

    #[error("Connection dropped before the response completed")]
    Disconnected,

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Encoded configuration is {actual} bytes, limit is {expected}")]
    EncodedTooLong { expected: usize, actual: usize },

    #[error("Not supported by the active protocol revision: {0}")]
    Unsupported(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for FoxError {
    fn from(err: serde_json::Error) -> Self {
        FoxError::InvalidConfig(err.to_string())
    }
}

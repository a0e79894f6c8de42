use crate::constants::{
    DEFAULT_ENDPOINT_IN, DEFAULT_ENDPOINT_OUT, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    HID_REPORT_SIZE, PRODUCT_ID, VENDOR_ID,
};
use crate::error::FoxError;
use crate::version::ProtocolRevision;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Driver settings. Every field has a default, so a JSON file only needs the
/// keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// USB interface carrying the HID reports
    pub interface: u8,
    pub endpoint_in: u8,
    pub endpoint_out: u8,
    pub report_size: usize,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay_ms: u64,
    /// Silence allowed between chunks of one response
    pub request_timeout_ms: u64,
    pub revision: ProtocolRevision,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            interface: 0,
            endpoint_in: DEFAULT_ENDPOINT_IN,
            endpoint_out: DEFAULT_ENDPOINT_OUT,
            report_size: HID_REPORT_SIZE,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            revision: ProtocolRevision::default(),
        }
    }
}

impl DriverConfig {
    pub fn from_json(json: &str) -> Result<Self, FoxError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FoxError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| FoxError::InvalidConfig(format!("{}: {err}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), FoxError> {
        if self.report_size == 0 {
            return Err(FoxError::InvalidConfig("report_size must be non-zero".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(FoxError::InvalidConfig("request_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

use crate::configuration::Configuration;
use crate::constants::{CONFIGURATION_LENGTH, DATAFLASH_LENGTH, MONITORING_DATA_LENGTH, SCREENSHOT_LENGTH};
use crate::error::FoxError;
use crate::monitoring::MonitoringData;
use bytes::Bytes;
use strum_macros::Display;

/// What the pending request expects back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExpectedKind {
    Monitoring,
    Configuration,
    ScreenCapture,
    Dataflash,
}

impl ExpectedKind {
    /// Total number of bytes that make up one complete answer.
    pub const fn expected_len(self) -> usize {
        match self {
            ExpectedKind::Monitoring => MONITORING_DATA_LENGTH,
            ExpectedKind::Configuration => CONFIGURATION_LENGTH,
            ExpectedKind::ScreenCapture => SCREENSHOT_LENGTH,
            ExpectedKind::Dataflash => DATAFLASH_LENGTH,
        }
    }
}

/// A complete, decoded answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Monitoring(MonitoringData),
    Configuration(Box<Configuration>),
    /// 1-bit-per-pixel screen image, passed through undecoded
    ScreenCapture(Bytes),
    Dataflash(Bytes),
}

impl Response {
    pub fn kind(&self) -> ExpectedKind {
        match self {
            Response::Monitoring(_) => ExpectedKind::Monitoring,
            Response::Configuration(_) => ExpectedKind::Configuration,
            Response::ScreenCapture(_) => ExpectedKind::ScreenCapture,
            Response::Dataflash(_) => ExpectedKind::Dataflash,
        }
    }

    fn mismatch(&self, wanted: ExpectedKind) -> FoxError {
        FoxError::MalformedResponse(format!("expected {wanted} answer, got {}", self.kind()))
    }

    pub fn into_monitoring(self) -> Result<MonitoringData, FoxError> {
        match self {
            Response::Monitoring(data) => Ok(data),
            other => Err(other.mismatch(ExpectedKind::Monitoring)),
        }
    }

    pub fn into_configuration(self) -> Result<Configuration, FoxError> {
        match self {
            Response::Configuration(config) => Ok(*config),
            other => Err(other.mismatch(ExpectedKind::Configuration)),
        }
    }

    pub fn into_screen_capture(self) -> Result<Bytes, FoxError> {
        match self {
            Response::ScreenCapture(image) => Ok(image),
            other => Err(other.mismatch(ExpectedKind::ScreenCapture)),
        }
    }

    pub fn into_dataflash(self) -> Result<Bytes, FoxError> {
        match self {
            Response::Dataflash(data) => Ok(data),
            other => Err(other.mismatch(ExpectedKind::Dataflash)),
        }
    }
}

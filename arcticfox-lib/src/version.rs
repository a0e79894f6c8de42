//! Compatibility gate for configuration records.

use crate::error::FoxError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Thresholds a configuration record must meet before it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionGate {
    /// The only settings layout this codec understands
    pub supported_settings_version: u8,
    /// Oldest firmware build whose settings are accepted
    pub minimum_build: u32,
}

impl VersionGate {
    pub const fn new(supported_settings_version: u8, minimum_build: u32) -> Self {
        Self {
            supported_settings_version,
            minimum_build,
        }
    }

    /// Newer settings layouts mean the driver is too old; older layouts or
    /// builds below the minimum mean the firmware is.
    pub fn check(&self, settings_version: u8, build: u32) -> Result<(), FoxError> {
        let supported = self.supported_settings_version;
        if settings_version > supported {
            warn!(settings_version, supported, "configuration written by newer firmware");
            return Err(FoxError::OutdatedTool {
                settings_version,
                supported,
            });
        }
        if build < self.minimum_build || settings_version < supported {
            warn!(build, minimum = self.minimum_build, settings_version, "firmware too old");
            return Err(FoxError::OutdatedFirmware {
                build,
                minimum: self.minimum_build,
                settings_version,
                supported,
            });
        }
        Ok(())
    }
}

impl Default for VersionGate {
    fn default() -> Self {
        ProtocolRevision::default().gate()
    }
}

/// Firmware compatibility window the driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolRevision {
    /// Read-only support for the first public firmware line
    Legacy,
    #[default]
    Current,
    /// Explicit thresholds, with configuration writes enabled
    Custom(VersionGate),
}

impl ProtocolRevision {
    pub fn gate(&self) -> VersionGate {
        match self {
            ProtocolRevision::Legacy => VersionGate::new(5, 160_410),
            ProtocolRevision::Current => VersionGate::new(6, 161_011),
            ProtocolRevision::Custom(gate) => *gate,
        }
    }

    pub fn supports_configuration_write(&self) -> bool {
        !matches!(self, ProtocolRevision::Legacy)
    }
}

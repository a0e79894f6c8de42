//! Codec for the 1088-byte configuration record.
//!
//! The record is a strict sequence of fixed-size sub-records:
//!
//! | offset | size | record |
//! |--------|------|--------|
//! | 0      | 21   | [`DeviceInfo`] |
//! | 21     | 232  | 8 x [`Profile`] |
//! | 253    | 3    | [`GeneralSettings`] |
//! | 256    | 95   | [`UiSettings`] |
//! | 351    | 679  | [`AdvancedSettings`] |
//! | 1030   | 58   | zero padding |

mod advanced;
mod clock;
mod device_info;
mod general;
mod profile;
mod ui;
pub(crate) mod wire;

pub use advanced::{AdvancedSettings, CurvePoint, CustomBattery, PercentVoltage, PowerCurve, TfrPoint, TfrTable};
pub use clock::DeviceClock;
pub use device_info::DeviceInfo;
pub use general::{GeneralSettings, SmartMode};
pub use profile::{Material, PiRegulator, PreheatType, Profile};
pub use ui::{Shortcuts, SkinLines, UiSettings};

use crate::constants::{CONFIGURATION_LENGTH, PROFILE_COUNT};
use crate::error::FoxError;
use crate::version::VersionGate;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wire::{read_array, read_record, write_array, write_record};

/// Byte offsets of each section inside the record.
pub mod offsets {
    pub const DEVICE_INFO: usize = 0;
    pub const PROFILES: usize = 21;
    pub const GENERAL: usize = 253;
    pub const UI: usize = 256;
    pub const ADVANCED: usize = 351;
    /// First padding byte
    pub const END: usize = 1030;
}

/// Decoded configuration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub device: DeviceInfo,
    pub profiles: [Profile; PROFILE_COUNT],
    pub general: GeneralSettings,
    pub ui: UiSettings,
    pub advanced: AdvancedSettings,
}

impl Configuration {
    /// Decode a record, rejecting it through `gate` right after the device
    /// header. Bytes past [`CONFIGURATION_LENGTH`] are ignored.
    pub fn decode(blob: &[u8], gate: &VersionGate) -> Result<Self, FoxError> {
        Self::decode_inner(blob, Some(gate))
    }

    /// Decode without any version check.
    pub fn decode_ungated(blob: &[u8]) -> Result<Self, FoxError> {
        Self::decode_inner(blob, None)
    }

    fn decode_inner(blob: &[u8], gate: Option<&VersionGate>) -> Result<Self, FoxError> {
        if blob.len() < CONFIGURATION_LENGTH {
            return Err(FoxError::InsufficientData {
                expected: CONFIGURATION_LENGTH,
                actual: blob.len(),
            });
        }
        let mut buf = &blob[..CONFIGURATION_LENGTH];

        let device: DeviceInfo = read_record(&mut buf)?;
        if let Some(gate) = gate {
            gate.check(device.settings_version, device.firmware_build)?;
        }
        let profiles = read_array(&mut buf)?;
        let general = read_record(&mut buf)?;
        let ui = read_record(&mut buf)?;
        let advanced = read_record(&mut buf)?;
        debug!(
            product = %device.product_id,
            build = device.firmware_build,
            padding = buf.len(),
            "decoded configuration"
        );

        Ok(Self {
            device,
            profiles,
            general,
            ui,
            advanced,
        })
    }

    /// Encode to exactly [`CONFIGURATION_LENGTH`] bytes, zero-padding the tail.
    pub fn encode(&self) -> Result<Bytes, FoxError> {
        let mut out = BytesMut::with_capacity(CONFIGURATION_LENGTH);
        write_record(&self.device, &mut out)?;
        write_array(&self.profiles, &mut out)?;
        write_record(&self.general, &mut out)?;
        write_record(&self.ui, &mut out)?;
        write_record(&self.advanced, &mut out)?;

        if out.len() > CONFIGURATION_LENGTH {
            return Err(FoxError::EncodedTooLong {
                expected: CONFIGURATION_LENGTH,
                actual: out.len(),
            });
        }
        out.put_bytes(0, CONFIGURATION_LENGTH - out.len());
        Ok(out.freeze())
    }

    /// The profile the device is currently using, if the index is in range.
    pub fn selected_profile(&self) -> Option<&Profile> {
        self.profiles.get(usize::from(self.general.selected_profile))
    }
}

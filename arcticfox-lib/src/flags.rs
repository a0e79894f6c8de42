//! Bit-packed configuration bytes.
//!
//! Every packed byte is declared once as a `modular-bitfield` struct so the
//! decode masks and the encode shifts come from the same definition. Fields
//! are listed LSB first.

use crate::error::FoxError;
use modular_bitfield::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile flag byte.
///
/// | bits | field |
/// |------|-------|
/// | 0-3  | material |
/// | 4    | temperature dominant |
/// | 5    | celsius |
/// | 6    | resistance locked |
/// | 7    | enabled |
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileFlags {
    pub material: B4,
    pub temperature_dominant: bool,
    pub celsius: bool,
    pub resistance_locked: bool,
    pub enabled: bool,
}

/// Skin line byte: bits 0-6 select what the line shows, bit 7 switches the
/// line to the puff counter display.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineContentBits {
    pub value: B7,
    pub puffs_display: bool,
}

/// Decoded content of one line on a main-screen skin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineContent {
    /// Index of the value shown on the line (0-127)
    pub value: u8,
    /// Show the puff counter instead of the indexed value
    pub puffs_display: bool,
}

impl LineContent {
    pub const MAX_VALUE: u8 = 0x7F;

    pub fn new(value: u8, puffs_display: bool) -> Self {
        Self { value, puffs_display }
    }

    pub fn from_byte(byte: u8) -> Self {
        let bits = LineContentBits::from_bytes([byte]);
        Self {
            value: bits.value(),
            puffs_display: bits.puffs_display(),
        }
    }

    pub fn to_byte(self) -> Result<u8, FoxError> {
        if self.value > Self::MAX_VALUE {
            return Err(FoxError::InvalidArgument(format!(
                "skin line value {} does not fit in 7 bits",
                self.value
            )));
        }
        let bits = LineContentBits::new()
            .with_value(self.value)
            .with_puffs_display(self.puffs_display);
        Ok(bits.into_bytes()[0])
    }
}

/// Map a stored byte to a boolean; any non-zero value is `true`.
pub(crate) fn byte_to_bool(byte: u8) -> bool {
    byte != 0
}

pub(crate) fn bool_to_byte(value: bool) -> u8 {
    u8::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_flags_bit_positions() {
        let flags = ProfileFlags::from_bytes([0b1010_0011]);
        assert_eq!(flags.material(), 3);
        assert!(!flags.temperature_dominant());
        assert!(flags.celsius());
        assert!(!flags.resistance_locked());
        assert!(flags.enabled());

        let rebuilt = ProfileFlags::new()
            .with_material(3)
            .with_celsius(true)
            .with_enabled(true);
        assert_eq!(rebuilt.into_bytes(), [0b1010_0011]);
    }

    #[test]
    fn line_content_without_puffs_flag() {
        let line = LineContent::from_byte(0x05);
        assert_eq!(line, LineContent::new(5, false));
        assert_eq!(line.to_byte().unwrap(), 0x05);
    }

    #[test]
    fn line_content_rejects_eight_bit_value() {
        assert!(matches!(
            LineContent::new(0x80, false).to_byte(),
            Err(FoxError::InvalidArgument(_))
        ));
    }
}

use super::wire::WireRecord;
use crate::error::FoxError;
use bytes::{Buf, BufMut, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum SmartMode {
    Off = 0,
    On = 1,
    Lazy = 2,

    #[num_enum(catch_all)]
    Unknown(u8),
}

// num_enum rejects `#[default]` next to `catch_all`
#[allow(clippy::derivable_impls)]
impl Default for SmartMode {
    fn default() -> Self {
        SmartMode::Off
    }
}

/// Active profile selection and smart-mode settings (3 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub selected_profile: u8,
    pub smart_mode: SmartMode,
    pub smart_range: u8,
}

impl WireRecord for GeneralSettings {
    const SIZE: usize = 3;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            selected_profile: buf.get_u8(),
            smart_mode: SmartMode::from_primitive(buf.get_u8()),
            smart_range: buf.get_u8(),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u8(self.selected_profile);
        out.put_u8(self.smart_mode.into());
        out.put_u8(self.smart_range);
        Ok(())
    }
}

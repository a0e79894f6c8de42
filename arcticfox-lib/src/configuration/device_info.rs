use super::wire::{WireRecord, read_name, scaled_u16, write_name};
use crate::error::FoxError;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Identity header at the start of the configuration record (21 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Layout revision of the settings blob
    pub settings_version: u8,
    /// Four-character product code, e.g. "E052"
    pub product_id: String,
    pub hardware_version: u32,
    /// Maximum output power in watts (stored x10)
    pub max_device_power: f64,
    pub number_of_batteries: u8,
    pub display_size: u8,
    pub firmware_version: u32,
    pub firmware_build: u32,
}

impl WireRecord for DeviceInfo {
    const SIZE: usize = 21;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            settings_version: buf.get_u8(),
            product_id: read_name(buf, 4),
            hardware_version: buf.get_u32_le(),
            max_device_power: f64::from(buf.get_u16_le()) / 10.0,
            number_of_batteries: buf.get_u8(),
            display_size: buf.get_u8(),
            firmware_version: buf.get_u32_le(),
            firmware_build: buf.get_u32_le(),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u8(self.settings_version);
        write_name(out, &self.product_id, 4)?;
        out.put_u32_le(self.hardware_version);
        out.put_u16_le(scaled_u16(self.max_device_power, 10.0, "max_device_power")?);
        out.put_u8(self.number_of_batteries);
        out.put_u8(self.display_size);
        out.put_u32_le(self.firmware_version);
        out.put_u32_le(self.firmware_build);
        Ok(())
    }
}

use super::wire::{WireRecord, read_name, scaled_i8, scaled_u8, scaled_u16, write_array, write_name};
use crate::constants::{CUSTOM_BATTERY_COUNT, POWER_CURVE_COUNT, TFR_TABLE_COUNT};
use crate::error::FoxError;
use crate::flags::{bool_to_byte, byte_to_bool};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// One point of a battery discharge curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentVoltage {
    pub percent: u16,
    /// Cell voltage in volts (stored x100)
    pub voltage: f64,
}

impl WireRecord for PercentVoltage {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            percent: buf.get_u16_le(),
            voltage: f64::from(buf.get_u16_le()) / 100.0,
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u16_le(self.percent);
        out.put_u16_le(scaled_u16(self.voltage, 100.0, "battery voltage")?);
        Ok(())
    }
}

/// User-defined battery discharge profile (50 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomBattery {
    pub name: String,
    pub points: [PercentVoltage; 11],
    /// Cutoff voltage in volts (stored x100)
    pub cutoff: f64,
}

impl WireRecord for CustomBattery {
    const SIZE: usize = 50;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            name: read_name(buf, 4),
            points: std::array::from_fn(|_| PercentVoltage::read(buf)),
            cutoff: f64::from(buf.get_u16_le()) / 100.0,
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        write_name(out, &self.name, 4)?;
        write_array(&self.points, out)?;
        out.put_u16_le(scaled_u16(self.cutoff, 100.0, "battery cutoff")?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TfrPoint {
    pub temperature: u16,
    /// Resistance factor (stored x10000)
    pub factor: f64,
}

impl WireRecord for TfrPoint {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            temperature: buf.get_u16_le(),
            factor: f64::from(buf.get_u16_le()) / 10000.0,
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u16_le(self.temperature);
        out.put_u16_le(scaled_u16(self.factor, 10000.0, "tfr factor")?);
        Ok(())
    }
}

/// Temperature factor of resistance table for a coil material (32 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfrTable {
    pub name: String,
    pub points: [TfrPoint; 7],
}

impl WireRecord for TfrTable {
    const SIZE: usize = 32;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            name: read_name(buf, 4),
            points: std::array::from_fn(|_| TfrPoint::read(buf)),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        write_name(out, &self.name, 4)?;
        write_array(&self.points, out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Seconds since the start of the puff (stored x10)
    pub time: f64,
    pub percent: u8,
}

impl WireRecord for CurvePoint {
    const SIZE: usize = 2;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            time: f64::from(buf.get_u8()) / 10.0,
            percent: buf.get_u8(),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u8(scaled_u8(self.time, 10.0, "curve time")?);
        out.put_u8(self.percent);
        Ok(())
    }
}

/// Power curve used by curve-type preheat (32 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    pub name: String,
    pub points: [CurvePoint; 12],
}

impl WireRecord for PowerCurve {
    const SIZE: usize = 32;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            name: read_name(buf, 8),
            points: std::array::from_fn(|_| CurvePoint::read(buf)),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        write_name(out, &self.name, 8)?;
        write_array(&self.points, out)
    }
}

/// Tuning block at the end of the configuration record (679 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    pub shunt_correction: u8,
    pub battery_model: u8,
    pub custom_batteries: [CustomBattery; CUSTOM_BATTERY_COUNT],
    pub rtc_mode: u8,
    pub is_usb_charge: bool,
    pub reset_counters_on_startup: bool,
    pub tfr_tables: [TfrTable; TFR_TABLE_COUNT],
    pub puff_cutoff: u8,
    pub power_curves: [PowerCurve; POWER_CURVE_COUNT],
    /// Per-cell voltage correction in volts (stored x100, signed)
    pub battery_voltage_offsets: [f64; 4],
    pub check_tcr: bool,
    pub usb_no_sleep: bool,
    pub deep_sleep_mode: u8,
    pub deep_sleep_delay: u8,
    /// Power limit in watts (stored x10)
    pub power_limit: f64,
    /// Battery internal resistance in ohms (stored x1000)
    pub internal_resistance: f64,
}

impl WireRecord for AdvancedSettings {
    const SIZE: usize = 679;

    fn read(buf: &mut &[u8]) -> Self {
        let shunt_correction = buf.get_u8();
        let battery_model = buf.get_u8();
        let custom_batteries = std::array::from_fn(|_| CustomBattery::read(buf));
        let rtc_mode = buf.get_u8();
        let is_usb_charge = byte_to_bool(buf.get_u8());
        let reset_counters_on_startup = byte_to_bool(buf.get_u8());
        let tfr_tables = std::array::from_fn(|_| TfrTable::read(buf));
        let puff_cutoff = buf.get_u8();
        let power_curves = std::array::from_fn(|_| PowerCurve::read(buf));
        let battery_voltage_offsets = std::array::from_fn(|_| f64::from(buf.get_i8()) / 100.0);
        Self {
            shunt_correction,
            battery_model,
            custom_batteries,
            rtc_mode,
            is_usb_charge,
            reset_counters_on_startup,
            tfr_tables,
            puff_cutoff,
            power_curves,
            battery_voltage_offsets,
            check_tcr: byte_to_bool(buf.get_u8()),
            usb_no_sleep: byte_to_bool(buf.get_u8()),
            deep_sleep_mode: buf.get_u8(),
            deep_sleep_delay: buf.get_u8(),
            power_limit: f64::from(buf.get_u16_le()) / 10.0,
            internal_resistance: f64::from(buf.get_u8()) / 1000.0,
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_u8(self.shunt_correction);
        out.put_u8(self.battery_model);
        write_array(&self.custom_batteries, out)?;
        out.put_u8(self.rtc_mode);
        out.put_u8(bool_to_byte(self.is_usb_charge));
        out.put_u8(bool_to_byte(self.reset_counters_on_startup));
        write_array(&self.tfr_tables, out)?;
        out.put_u8(self.puff_cutoff);
        write_array(&self.power_curves, out)?;
        for offset in self.battery_voltage_offsets {
            out.put_i8(scaled_i8(offset, 100.0, "battery voltage offset")?);
        }
        out.put_u8(bool_to_byte(self.check_tcr));
        out.put_u8(bool_to_byte(self.usb_no_sleep));
        out.put_u8(self.deep_sleep_mode);
        out.put_u8(self.deep_sleep_delay);
        out.put_u16_le(scaled_u16(self.power_limit, 10.0, "power_limit")?);
        out.put_u8(scaled_u8(self.internal_resistance, 1000.0, "internal_resistance")?);
        Ok(())
    }
}

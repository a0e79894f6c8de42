use crate::constants::MONITORING_DATA_LENGTH;
use crate::error::FoxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Offset added to a non-zero battery byte, in hundredths of a volt.
const BATTERY_VOLTAGE_OFFSET: f64 = 275.0;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct MonitoringDataRaw {
    pub timestamp: U32,
    pub is_firing: u8,
    pub is_charging: u8,
    pub is_celsius: u8,
    // 0 = slot empty, otherwise (raw + 275) / 100 V
    pub battery_voltages: [u8; 4],
    pub power_set: U16,       // 0.1 W
    pub temperature_set: U16, // degrees in the unit given by is_celsius
    pub temperature: U16,
    pub output_voltage: U16, // 0.01 V
    pub output_current: U16, // 0.01 A
    pub resistance: U16,     // mOhm
    pub real_resistance: U16, // mOhm
    pub board_temperature: u8,
    pub reserved: [u8; 38],
}

/// One telemetry sample converted to physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoringData {
    pub timestamp: u32,
    pub is_firing: bool,
    pub is_charging: bool,
    pub is_celsius: bool,
    /// Cell voltages in volts; 0.0 for an empty slot
    pub battery_voltages: [f64; 4],
    /// Power setpoint in watts
    pub power_set: f64,
    pub temperature_set: u16,
    pub temperature: u16,
    /// Output voltage in volts
    pub output_voltage: f64,
    /// Output current in amperes
    pub output_current: f64,
    /// Output voltage x current, rounded to 2 decimals
    pub output_power: f64,
    /// Coil resistance in ohms
    pub resistance: f64,
    /// Measured coil resistance in ohms
    pub real_resistance: f64,
    pub board_temperature: u8,
}

fn battery_voltage(raw: u8) -> f64 {
    if raw == 0 {
        0.0
    } else {
        (f64::from(raw) + BATTERY_VOLTAGE_OFFSET) / 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<MonitoringDataRaw> for MonitoringData {
    fn from(raw: MonitoringDataRaw) -> Self {
        let output_voltage = f64::from(raw.output_voltage.get()) / 100.0;
        let output_current = f64::from(raw.output_current.get()) / 100.0;

        MonitoringData {
            timestamp: raw.timestamp.get(),
            is_firing: raw.is_firing != 0,
            is_charging: raw.is_charging != 0,
            is_celsius: raw.is_celsius != 0,
            battery_voltages: raw.battery_voltages.map(battery_voltage),
            power_set: f64::from(raw.power_set.get()) / 10.0,
            temperature_set: raw.temperature_set.get(),
            temperature: raw.temperature.get(),
            output_voltage,
            output_current,
            output_power: round2(output_voltage * output_current),
            resistance: f64::from(raw.resistance.get()) / 1000.0,
            real_resistance: f64::from(raw.real_resistance.get()) / 1000.0,
            board_temperature: raw.board_temperature,
        }
    }
}

impl MonitoringData {
    /// Decode one 64-byte monitoring frame.
    ///
    /// Longer input is accepted and the excess ignored; shorter input is a
    /// malformed response.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FoxError> {
        let (raw, _) = MonitoringDataRaw::ref_from_prefix(bytes).map_err(|_| {
            FoxError::MalformedResponse(format!(
                "monitoring frame is {} bytes, expected {}",
                bytes.len(),
                MONITORING_DATA_LENGTH
            ))
        })?;
        Ok(MonitoringData::from(*raw))
    }

    /// Number of battery slots reporting a voltage
    pub fn battery_count(&self) -> usize {
        self.battery_voltages.iter().filter(|v| **v > 0.0).count()
    }

    fn temperature_unit(&self) -> &'static str {
        if self.is_celsius { "°C" } else { "°F" }
    }
}

impl fmt::Display for MonitoringData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.temperature_unit();
        write!(f, "Batteries:")?;
        for voltage in self.battery_voltages.iter().filter(|v| **v > 0.0) {
            write!(f, " {voltage:.2} V")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Set: {:.1} W / {} {unit}, Coil: {:.3} Ω (real {:.3} Ω)",
            self.power_set, self.temperature_set, self.resistance, self.real_resistance
        )?;
        write!(
            f,
            "Out: {:.2} V, {:.2} A, {:.2} W, Temp: {} {unit}, Board: {} {unit}{}{}",
            self.output_voltage,
            self.output_current,
            self.output_power,
            self.temperature,
            self.board_temperature,
            if self.is_firing { ", firing" } else { "" },
            if self.is_charging { ", charging" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_layout_matches_frame_length() {
        assert_eq!(size_of::<MonitoringDataRaw>(), MONITORING_DATA_LENGTH);
    }

    #[test]
    fn empty_battery_slot_reads_zero() {
        assert_eq!(battery_voltage(0), 0.0);
        assert_eq!(battery_voltage(137), 4.12);
    }
}

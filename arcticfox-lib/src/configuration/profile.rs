use super::wire::{WireRecord, read_name, scaled_u8, scaled_u16, write_name};
use crate::error::FoxError;
use crate::flags::{ProfileFlags, bool_to_byte, byte_to_bool};
use bytes::{Buf, BufMut, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Coil material, stored in the low nibble of the profile flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum Material {
    #[strum(to_string = "VW")]
    VariWatt = 0,
    #[strum(to_string = "Ni")]
    Nickel = 1,
    #[strum(to_string = "Ti")]
    Titanium = 2,
    #[strum(to_string = "SS")]
    StainlessSteel = 3,
    #[strum(to_string = "TCR")]
    Tcr = 4,
    Tfr1 = 5,
    Tfr2 = 6,
    Tfr3 = 7,
    Tfr4 = 8,
    Tfr5 = 9,
    Tfr6 = 10,
    Tfr7 = 11,
    Tfr8 = 12,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// How `preheat_power` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum PreheatType {
    /// Absolute power, 0.1 W units
    Watts = 0,
    /// Percentage of the profile power
    Percent = 1,
    /// Follow the power curve selected by `selected_curve`
    Curve = 2,

    #[num_enum(catch_all)]
    Unknown(u8),
}

// num_enum rejects `#[default]` next to `catch_all`
#[allow(clippy::derivable_impls)]
impl Default for Material {
    fn default() -> Self {
        Material::VariWatt
    }
}

// num_enum rejects `#[default]` next to `catch_all`
#[allow(clippy::derivable_impls)]
impl Default for PreheatType {
    fn default() -> Self {
        PreheatType::Watts
    }
}

/// PI regulator block of a temperature-control profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiRegulator {
    pub is_enabled: bool,
    pub range: u8,
    pub p_value: u16,
    pub i_value: u16,
}

/// One user profile (29 bytes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub material: Material,
    pub is_temperature_dominant: bool,
    pub is_celsius: bool,
    pub is_resistance_locked: bool,
    pub is_enabled: bool,
    pub preheat_type: PreheatType,
    pub selected_curve: u8,
    /// Preheat duration in seconds (stored x100)
    pub preheat_time: f64,
    pub preheat_delay: u8,
    /// Raw preheat amount, see [`PreheatType`]
    pub preheat_power: u16,
    /// Power in watts (stored x10)
    pub power: f64,
    pub temperature: u16,
    /// Coil resistance in ohms (stored x1000)
    pub resistance: f64,
    pub tcr: u16,
    pub pi_regulator: PiRegulator,
}

impl Profile {
    const NAME_WIDTH: usize = 8;

    fn flags(&self) -> Result<ProfileFlags, FoxError> {
        let material: u8 = self.material.into();
        if material > 0x0F {
            return Err(FoxError::InvalidArgument(format!(
                "material {material} does not fit in 4 bits"
            )));
        }
        Ok(ProfileFlags::new()
            .with_material(material)
            .with_temperature_dominant(self.is_temperature_dominant)
            .with_celsius(self.is_celsius)
            .with_resistance_locked(self.is_resistance_locked)
            .with_enabled(self.is_enabled))
    }
}

impl WireRecord for Profile {
    const SIZE: usize = 29;

    fn read(buf: &mut &[u8]) -> Self {
        let name = read_name(buf, Self::NAME_WIDTH);
        let flags = ProfileFlags::from_bytes([buf.get_u8()]);
        Self {
            name,
            material: Material::from_primitive(flags.material()),
            is_temperature_dominant: flags.temperature_dominant(),
            is_celsius: flags.celsius(),
            is_resistance_locked: flags.resistance_locked(),
            is_enabled: flags.enabled(),
            preheat_type: PreheatType::from_primitive(buf.get_u8()),
            selected_curve: buf.get_u8(),
            preheat_time: f64::from(buf.get_u8()) / 100.0,
            preheat_delay: buf.get_u8(),
            preheat_power: buf.get_u16_le(),
            power: f64::from(buf.get_u16_le()) / 10.0,
            temperature: buf.get_u16_le(),
            resistance: f64::from(buf.get_u16_le()) / 1000.0,
            tcr: buf.get_u16_le(),
            pi_regulator: PiRegulator {
                is_enabled: byte_to_bool(buf.get_u8()),
                range: buf.get_u8(),
                p_value: buf.get_u16_le(),
                i_value: buf.get_u16_le(),
            },
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        write_name(out, &self.name, Self::NAME_WIDTH)?;
        out.put_slice(&self.flags()?.into_bytes());
        out.put_u8(self.preheat_type.into());
        out.put_u8(self.selected_curve);
        out.put_u8(scaled_u8(self.preheat_time, 100.0, "preheat_time")?);
        out.put_u8(self.preheat_delay);
        out.put_u16_le(self.preheat_power);
        out.put_u16_le(scaled_u16(self.power, 10.0, "power")?);
        out.put_u16_le(self.temperature);
        out.put_u16_le(scaled_u16(self.resistance, 1000.0, "resistance")?);
        out.put_u16_le(self.tcr);
        out.put_u8(bool_to_byte(self.pi_regulator.is_enabled));
        out.put_u8(self.pi_regulator.range);
        out.put_u16_le(self.pi_regulator.p_value);
        out.put_u16_le(self.pi_regulator.i_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::wire::{read_record, write_record};

    #[test]
    fn unknown_material_survives_decode() {
        assert_eq!(Material::from_primitive(14), Material::Unknown(14));
        assert_eq!(u8::from(Material::Unknown(14)), 14);
    }

    #[test]
    fn flags_byte_round_trip() {
        let mut raw = [0u8; Profile::SIZE];
        raw[..3].copy_from_slice(b"TC1");
        raw[8] = 0xF1; // Ni, every flag set
        let mut buf: &[u8] = &raw;
        let profile: Profile = read_record(&mut buf).unwrap();
        assert_eq!(profile.name, "TC1");
        assert_eq!(profile.material, Material::Nickel);
        assert!(profile.is_temperature_dominant);
        assert!(profile.is_celsius);
        assert!(profile.is_resistance_locked);
        assert!(profile.is_enabled);

        let mut out = BytesMut::new();
        write_record(&profile, &mut out).unwrap();
        assert_eq!(out.as_ref(), raw.as_slice());
    }
}

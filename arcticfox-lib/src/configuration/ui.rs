use super::clock::DeviceClock;
use super::wire::WireRecord;
use crate::error::FoxError;
use crate::flags::{LineContent, bool_to_byte, byte_to_bool};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Button combination actions for one profile slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    pub in_standby: u8,
    pub in_edit_main: u8,
    pub in_selector: u8,
    pub in_menu: u8,
}

impl WireRecord for Shortcuts {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            in_standby: buf.get_u8(),
            in_edit_main: buf.get_u8(),
            in_selector: buf.get_u8(),
            in_menu: buf.get_u8(),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_slice(&[self.in_standby, self.in_edit_main, self.in_selector, self.in_menu]);
        Ok(())
    }
}

/// Which value each line of a main-screen skin shows, split by VW and TC mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinLines {
    pub classic_vw: [LineContent; 4],
    pub classic_tc: [LineContent; 4],
    pub circle_vw: [LineContent; 3],
    pub circle_tc: [LineContent; 3],
    pub foxy_vw: [LineContent; 3],
    pub foxy_tc: [LineContent; 3],
    pub small_vw: [LineContent; 2],
    pub small_tc: [LineContent; 2],
}

fn read_lines<const N: usize>(buf: &mut &[u8]) -> [LineContent; N] {
    std::array::from_fn(|_| LineContent::from_byte(buf.get_u8()))
}

fn write_lines(out: &mut BytesMut, lines: &[LineContent]) -> Result<(), FoxError> {
    for line in lines {
        out.put_u8(line.to_byte()?);
    }
    Ok(())
}

fn read_flag(buf: &mut &[u8]) -> bool {
    byte_to_bool(buf.get_u8())
}

impl WireRecord for SkinLines {
    const SIZE: usize = 24;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            classic_vw: read_lines(buf),
            classic_tc: read_lines(buf),
            circle_vw: read_lines(buf),
            circle_tc: read_lines(buf),
            foxy_vw: read_lines(buf),
            foxy_tc: read_lines(buf),
            small_vw: read_lines(buf),
            small_tc: read_lines(buf),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        write_lines(out, &self.classic_vw)?;
        write_lines(out, &self.classic_tc)?;
        write_lines(out, &self.circle_vw)?;
        write_lines(out, &self.circle_tc)?;
        write_lines(out, &self.foxy_vw)?;
        write_lines(out, &self.foxy_tc)?;
        write_lines(out, &self.small_vw)?;
        write_lines(out, &self.small_tc)
    }
}

/// Display and input settings (95 bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    pub clicks_vw: [u8; 3],
    pub clicks_tc: [u8; 3],
    pub shortcuts_vw: [Shortcuts; 3],
    pub shortcuts_tc: [Shortcuts; 3],
    pub skins: SkinLines,

    pub brightness: u8,
    pub dim_timeout: u8,
    pub dim_timeout_locked: u8,
    pub dim_timeout_charging: u8,
    pub show_logo_delay: u8,
    pub show_clock_delay: u8,

    pub is_flipped: bool,
    pub is_stealth_mode: bool,
    pub wake_up_by_plus_minus: bool,
    pub is_power_step_1w: bool,
    pub is_temperature_step_1c2f: bool,

    pub charge_screen_type: u8,
    pub charge_extra_type: u8,
    pub is_logo_enabled: bool,
    pub is_classic_menu: bool,
    pub clock_type: u8,
    pub is_clock_on_main_screen: bool,

    pub screensave_duration: u8,
    pub puff_screen_delay: u8,
    pub puffs_time_format: u8,
    pub main_screen_skin: u8,
    pub is_up_down_swapped: bool,
    pub show_charging_in_stealth: bool,
    pub show_screensaver_in_stealth: bool,
    pub clock_on_click_in_stealth: bool,
    pub five_clicks: u8,

    /// Lifetime puff counter
    pub puffs_count: u32,
    /// Lifetime firing time in tenths of a second
    pub puffs_time: u32,
    pub clock: DeviceClock,
}

impl WireRecord for UiSettings {
    const SIZE: usize = 95;

    fn read(buf: &mut &[u8]) -> Self {
        let clicks_vw = [buf.get_u8(), buf.get_u8(), buf.get_u8()];
        let clicks_tc = [buf.get_u8(), buf.get_u8(), buf.get_u8()];
        let shortcuts_vw = std::array::from_fn(|_| Shortcuts::read(buf));
        let shortcuts_tc = std::array::from_fn(|_| Shortcuts::read(buf));
        Self {
            clicks_vw,
            clicks_tc,
            shortcuts_vw,
            shortcuts_tc,
            skins: SkinLines::read(buf),
            brightness: buf.get_u8(),
            dim_timeout: buf.get_u8(),
            dim_timeout_locked: buf.get_u8(),
            dim_timeout_charging: buf.get_u8(),
            show_logo_delay: buf.get_u8(),
            show_clock_delay: buf.get_u8(),
            is_flipped: read_flag(buf),
            is_stealth_mode: read_flag(buf),
            wake_up_by_plus_minus: read_flag(buf),
            is_power_step_1w: read_flag(buf),
            is_temperature_step_1c2f: read_flag(buf),
            charge_screen_type: buf.get_u8(),
            charge_extra_type: buf.get_u8(),
            is_logo_enabled: read_flag(buf),
            is_classic_menu: read_flag(buf),
            clock_type: buf.get_u8(),
            is_clock_on_main_screen: read_flag(buf),
            screensave_duration: buf.get_u8(),
            puff_screen_delay: buf.get_u8(),
            puffs_time_format: buf.get_u8(),
            main_screen_skin: buf.get_u8(),
            is_up_down_swapped: read_flag(buf),
            show_charging_in_stealth: read_flag(buf),
            show_screensaver_in_stealth: read_flag(buf),
            clock_on_click_in_stealth: read_flag(buf),
            five_clicks: buf.get_u8(),
            puffs_count: buf.get_u32_le(),
            puffs_time: buf.get_u32_le(),
            clock: DeviceClock::read(buf),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_slice(&self.clicks_vw);
        out.put_slice(&self.clicks_tc);
        for shortcuts in self.shortcuts_vw.iter().chain(&self.shortcuts_tc) {
            shortcuts.write(out)?;
        }
        self.skins.write(out)?;

        out.put_slice(&[
            self.brightness,
            self.dim_timeout,
            self.dim_timeout_locked,
            self.dim_timeout_charging,
            self.show_logo_delay,
            self.show_clock_delay,
            bool_to_byte(self.is_flipped),
            bool_to_byte(self.is_stealth_mode),
            bool_to_byte(self.wake_up_by_plus_minus),
            bool_to_byte(self.is_power_step_1w),
            bool_to_byte(self.is_temperature_step_1c2f),
            self.charge_screen_type,
            self.charge_extra_type,
            bool_to_byte(self.is_logo_enabled),
            bool_to_byte(self.is_classic_menu),
            self.clock_type,
            bool_to_byte(self.is_clock_on_main_screen),
            self.screensave_duration,
            self.puff_screen_delay,
            self.puffs_time_format,
            self.main_screen_skin,
            bool_to_byte(self.is_up_down_swapped),
            bool_to_byte(self.show_charging_in_stealth),
            bool_to_byte(self.show_screensaver_in_stealth),
            bool_to_byte(self.clock_on_click_in_stealth),
            self.five_clicks,
        ]);
        out.put_u32_le(self.puffs_count);
        out.put_u32_le(self.puffs_time);
        self.clock.write(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::wire::{read_record, write_record};

    #[test]
    fn skin_line_puff_bit() {
        let mut raw = [0u8; UiSettings::SIZE];
        // first classic VW line sits after clicks (6) and shortcuts (24)
        raw[30] = 0x85;
        let mut buf: &[u8] = &raw;
        let ui: UiSettings = read_record(&mut buf).unwrap();
        assert_eq!(ui.skins.classic_vw[0], LineContent::new(5, true));

        let mut out = BytesMut::new();
        write_record(&ui, &mut out).unwrap();
        assert_eq!(out[30], 0x85);
    }

    #[test]
    fn counters_and_clock_are_at_the_tail() {
        let mut raw = [0u8; UiSettings::SIZE];
        raw[80..84].copy_from_slice(&1234u32.to_le_bytes());
        raw[88..90].copy_from_slice(&2017u16.to_le_bytes());
        raw[90] = 3;
        raw[91] = 14;
        let mut buf: &[u8] = &raw;
        let ui: UiSettings = read_record(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(ui.puffs_count, 1234);
        assert_eq!(ui.clock.year, 2017);
        assert_eq!(ui.clock.month, 3);
        assert_eq!(ui.clock.day, 14);
    }
}

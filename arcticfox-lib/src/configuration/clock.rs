use super::wire::WireRecord;
use crate::error::FoxError;
use bytes::{Buf, BufMut, BytesMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock fields as the firmware stores them (7 bytes).
///
/// The same layout is the payload of the set-date-time command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClock {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DeviceClock {
    /// `None` when the stored fields are not a valid date (e.g. a cleared RTC).
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))?.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    pub fn to_bytes(&self) -> [u8; 7] {
        let [year_lo, year_hi] = self.year.to_le_bytes();
        [year_lo, year_hi, self.month, self.day, self.hour, self.minute, self.second]
    }
}

impl TryFrom<NaiveDateTime> for DeviceClock {
    type Error = FoxError;

    fn try_from(value: NaiveDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(value.year())
            .map_err(|_| FoxError::InvalidArgument(format!("year {} cannot be stored", value.year())))?;
        // chrono guarantees the remaining fields fit in a byte
        Ok(Self {
            year,
            month: value.month() as u8,
            day: value.day() as u8,
            hour: value.hour() as u8,
            minute: value.minute() as u8,
            second: value.second() as u8,
        })
    }
}

impl WireRecord for DeviceClock {
    const SIZE: usize = 7;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            year: buf.get_u16_le(),
            month: buf.get_u8(),
            day: buf.get_u8(),
            hour: buf.get_u8(),
            minute: buf.get_u8(),
            second: buf.get_u8(),
        }
    }

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError> {
        out.put_slice(&self.to_bytes());
        Ok(())
    }
}

use crate::constants::{COMMAND_HEADER_SIZE, COMMAND_MARKER, PROTOCOL_TAG};
use crate::error::FoxError;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// One-byte command codes understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    ReadDataflash = 0x35,
    WriteDataflash = 0x53,
    ResetDataflash = 0x7C,
    WriteData = 0xC3,
    Restart = 0xB4,
    Screenshot = 0xC1,
    ReadMonitoringData = 0x66,
    Puff = 0x44,
    ReadConfiguration = 0x60,
    WriteConfiguration = 0x61,
    SetDateTime = 0x64,
    SetLogo = 0xA5,
}

/// Fixed 14-byte head of a command frame, before the checksum suffix.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CommandHeaderRaw {
    pub opcode: u8,
    pub protocol_tag: u8,
    pub arg1: U32,
    pub arg2: U32,
    pub marker: [u8; 4],
}

/// A host-to-device command: opcode plus two little-endian arguments.
///
/// On the wire the 14-byte header is followed by a variable-length checksum
/// suffix, see [`checksum_suffix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub opcode: Opcode,
    pub arg1: u32,
    pub arg2: u32,
}

impl CommandFrame {
    pub fn new(opcode: Opcode, arg1: u32, arg2: u32) -> Self {
        Self { opcode, arg1, arg2 }
    }

    fn header(&self) -> CommandHeaderRaw {
        CommandHeaderRaw {
            opcode: self.opcode.into(),
            protocol_tag: PROTOCOL_TAG,
            arg1: U32::new(self.arg1),
            arg2: U32::new(self.arg2),
            marker: COMMAND_MARKER,
        }
    }

    /// Serialize the frame, checksum suffix included.
    pub fn to_bytes(&self) -> Bytes {
        let header = self.header();
        let head = header.as_bytes();
        let suffix = checksum_suffix(head);

        let mut frame = BytesMut::with_capacity(head.len() + suffix.len());
        frame.put_slice(head);
        frame.put_slice(&suffix);
        frame.freeze()
    }
}

impl From<CommandFrame> for Bytes {
    fn from(frame: CommandFrame) -> Self {
        frame.to_bytes()
    }
}

/// Parses a frame as produced by [`CommandFrame::to_bytes`].
///
/// Trailing zero bytes after the suffix are accepted, since frames travel
/// inside zero-padded HID reports.
impl TryFrom<&[u8]> for CommandFrame {
    type Error = FoxError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let (header, rest) = CommandHeaderRaw::ref_from_prefix(bytes).map_err(|_| {
            FoxError::InvalidFrame(format!(
                "frame too short: {} bytes, header needs {}",
                bytes.len(),
                COMMAND_HEADER_SIZE
            ))
        })?;

        if header.protocol_tag != PROTOCOL_TAG {
            return Err(FoxError::InvalidFrame(format!(
                "unexpected protocol tag {}",
                header.protocol_tag
            )));
        }
        if header.marker != COMMAND_MARKER {
            return Err(FoxError::InvalidFrame(format!(
                "missing HIDC marker, got {}",
                hex::encode(header.marker)
            )));
        }

        let expected = checksum_suffix(header.as_bytes());
        let actual = rest.get(..expected.len()).ok_or_else(|| {
            FoxError::InvalidFrame(format!(
                "checksum suffix truncated: need {} bytes, have {}",
                expected.len(),
                rest.len()
            ))
        })?;
        if actual != expected.as_slice() {
            return Err(FoxError::InvalidFrame(format!(
                "checksum mismatch: expected {}, got {}",
                hex::encode(&expected),
                hex::encode(actual)
            )));
        }
        if rest[expected.len()..].iter().any(|&b| b != 0) {
            return Err(FoxError::InvalidFrame("non-zero bytes after checksum".to_string()));
        }

        let opcode = Opcode::try_from(header.opcode)
            .map_err(|_| FoxError::InvalidFrame(format!("unknown opcode {:#04x}", header.opcode)))?;

        Ok(Self {
            opcode,
            arg1: header.arg1.get(),
            arg2: header.arg2.get(),
        })
    }
}

/// Running-sum checksum: sum every byte, then emit the low byte of the sum
/// and shift right by 8 until the sum is zero.
///
/// The result is 0 to 4 bytes long; the firmware checks it byte for byte.
pub fn checksum_suffix(bytes: &[u8]) -> Vec<u8> {
    let mut sum: u64 = bytes.iter().map(|&b| u64::from(b)).sum();
    let mut suffix = Vec::with_capacity(4);
    while sum > 0 {
        suffix.push((sum & 0xFF) as u8);
        sum >>= 8;
    }
    suffix
}

/// Build the serialized command frame for `opcode` with its two arguments.
pub fn build_command(opcode: Opcode, arg1: u32, arg2: u32) -> Bytes {
    CommandFrame::new(opcode, arg1, arg2).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_fourteen_bytes() {
        assert_eq!(size_of::<CommandHeaderRaw>(), COMMAND_HEADER_SIZE);
    }

    #[test]
    fn empty_input_has_empty_suffix() {
        assert!(checksum_suffix(&[]).is_empty());
        assert!(checksum_suffix(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn suffix_grows_with_sum() {
        assert_eq!(checksum_suffix(&[0x10]), vec![0x10]);
        assert_eq!(checksum_suffix(&[0xFF, 0x01]), vec![0x00, 0x01]);
        assert_eq!(checksum_suffix(&[0xFF; 300]), vec![0xD4, 0x2A, 0x01]);
    }
}

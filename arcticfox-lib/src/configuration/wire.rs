//! Fixed-size record plumbing shared by every configuration sub-record.

use crate::error::FoxError;
use bytes::{Buf, BufMut, BytesMut};

/// A sub-record with a fixed wire size.
///
/// `read` is only called once at least `SIZE` bytes remain, so it may use the
/// panicking `Buf` getters. Both directions must touch exactly `SIZE` bytes.
pub(crate) trait WireRecord: Sized {
    const SIZE: usize;

    fn read(buf: &mut &[u8]) -> Self;

    fn write(&self, out: &mut BytesMut) -> Result<(), FoxError>;
}

/// Decode one record from the front of `buf`, advancing it past the record.
pub(crate) fn read_record<R: WireRecord>(buf: &mut &[u8]) -> Result<R, FoxError> {
    if buf.remaining() < R::SIZE {
        return Err(FoxError::InsufficientData {
            expected: R::SIZE,
            actual: buf.remaining(),
        });
    }
    let before = buf.remaining();
    let record = R::read(buf);
    debug_assert_eq!(before - buf.remaining(), R::SIZE, "decoder consumed the wrong size");
    Ok(record)
}

pub(crate) fn read_array<R: WireRecord, const N: usize>(buf: &mut &[u8]) -> Result<[R; N], FoxError> {
    let needed = R::SIZE * N;
    if buf.remaining() < needed {
        return Err(FoxError::InsufficientData {
            expected: needed,
            actual: buf.remaining(),
        });
    }
    Ok(std::array::from_fn(|_| R::read(buf)))
}

pub(crate) fn write_record<R: WireRecord>(record: &R, out: &mut BytesMut) -> Result<(), FoxError> {
    let start = out.len();
    record.write(out)?;
    debug_assert_eq!(out.len() - start, R::SIZE, "encoder produced the wrong size");
    Ok(())
}

pub(crate) fn write_array<R: WireRecord>(records: &[R], out: &mut BytesMut) -> Result<(), FoxError> {
    records.iter().try_for_each(|record| write_record(record, out))
}

/// Fixed-width text field, one byte per char (Latin-1), so every stored
/// byte survives a decode/encode cycle. Trailing NULs are trimmed on read.
pub(crate) fn read_name(buf: &mut &[u8], width: usize) -> String {
    let field = &buf[..width];
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    let name = field[..end].iter().map(|&b| char::from(b)).collect();
    buf.advance(width);
    name
}

/// Fixed-width text field: chars up to U+00FF, NUL-padded to `width`.
pub(crate) fn write_name(out: &mut BytesMut, name: &str, width: usize) -> Result<(), FoxError> {
    let bytes = name
        .chars()
        .map(|c| {
            u8::try_from(c)
                .map_err(|_| FoxError::InvalidArgument(format!("name {name:?} has {c:?}, not a single-byte char")))
        })
        .collect::<Result<Vec<u8>, FoxError>>()?;
    if bytes.len() > width {
        return Err(FoxError::InvalidArgument(format!(
            "name {name:?} is longer than {width} bytes"
        )));
    }
    out.put_slice(&bytes);
    out.put_bytes(0, width - bytes.len());
    Ok(())
}

fn scale_to_raw(value: f64, scale: f64, field: &str, min: f64, max: f64) -> Result<f64, FoxError> {
    let raw = (value * scale).round();
    if !raw.is_finite() || raw < min || raw > max {
        return Err(FoxError::InvalidArgument(format!(
            "{field} = {value} is out of range after scaling by {scale}"
        )));
    }
    Ok(raw)
}

/// Scale a physical value to its stored `u8`, rounding half away from zero.
pub(crate) fn scaled_u8(value: f64, scale: f64, field: &str) -> Result<u8, FoxError> {
    scale_to_raw(value, scale, field, 0.0, f64::from(u8::MAX)).map(|raw| raw as u8)
}

pub(crate) fn scaled_i8(value: f64, scale: f64, field: &str) -> Result<i8, FoxError> {
    scale_to_raw(value, scale, field, f64::from(i8::MIN), f64::from(i8::MAX)).map(|raw| raw as i8)
}

pub(crate) fn scaled_u16(value: f64, scale: f64, field: &str) -> Result<u16, FoxError> {
    scale_to_raw(value, scale, field, 0.0, f64::from(u16::MAX)).map(|raw| raw as u16)
}

//! Fixed-width little-endian two's-complement integer slots.
//!
//! Writer and reader must agree on the slot width; the supported widths are
//! 1, 2, 4 and 8 bytes.

use super::CodecError;

pub const DEFAULT_WIDTH: usize = 4;
pub const MAX_WIDTH: usize = 8;

#[inline(always)]
pub fn is_supported(width: usize) -> bool {
    matches!(width, 1 | 2 | 4 | 8)
}

pub fn value_range(width: usize) -> Option<(i64, i64)> {
    match width {
        1 => Some((i8::MIN as i64, i8::MAX as i64)),
        2 => Some((i16::MIN as i64, i16::MAX as i64)),
        4 => Some((i32::MIN as i64, i32::MAX as i64)),
        8 => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

/// Encodes `value` into `slot`, whose length selects the width. Fails without
/// touching `slot` when the value does not fit.
pub fn encode(value: i64, slot: &mut [u8]) -> Result<(), CodecError> {
    match slot.len() {
        1 => {
            let v = i8::try_from(value)
                .map_err(|_| CodecError::ValueOutOfRange { value, width: 1 })?;
            slot.copy_from_slice(&v.to_le_bytes());
        }
        2 => {
            let v = i16::try_from(value)
                .map_err(|_| CodecError::ValueOutOfRange { value, width: 2 })?;
            slot.copy_from_slice(&v.to_le_bytes());
        }
        4 => {
            let v = i32::try_from(value)
                .map_err(|_| CodecError::ValueOutOfRange { value, width: 4 })?;
            slot.copy_from_slice(&v.to_le_bytes());
        }
        8 => {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        width => return Err(CodecError::UnsupportedWidth { width }),
    }
    Ok(())
}

/// Decodes one slot back into its logical value. A slice that is not a
/// supported width signals corruption or a writer/reader width mismatch.
pub fn decode(slot: &[u8]) -> Result<i64, CodecError> {
    match slot.len() {
        1 => Ok(i8::from_le_bytes([slot[0]]) as i64),
        2 => {
            let mut bytes = [0u8; 2];
            bytes.copy_from_slice(slot);
            Ok(i16::from_le_bytes(bytes) as i64)
        }
        4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(slot);
            Ok(i32::from_le_bytes(bytes) as i64)
        }
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(slot);
            Ok(i64::from_le_bytes(bytes))
        }
        width => Err(CodecError::UnsupportedWidth { width }),
    }
}

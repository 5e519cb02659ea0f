//! EO number and string codecs
//!
//! Numbers are written as base-254 digits, most significant digit first.
//! Every digit is stored biased by one, so a valid number byte is always in
//! `1..=254`. The two remaining byte values never occur inside a number:
//! `0x00` is unused and `0xFF` is the break byte that terminates strings and
//! rows.

use crate::error::EncodingError;
use bytes::{BufMut, BytesMut};

/// Radix of the number encoding
pub const NUMBER_BASE: u64 = 254;

/// Bias added to every digit
pub const DIGIT_BIAS: u8 = 1;

/// Sentinel byte terminating break strings and run-length rows
pub const BREAK_BYTE: u8 = 0xFF;

/// Largest value encodable in one byte
pub const CHAR_MAX: u32 = 253;

/// Largest value encodable in two bytes
pub const SHORT_MAX: u32 = 64_515;

/// Largest value encodable in three bytes
pub const THREE_MAX: u32 = 16_387_063;

/// Largest value encodable in four bytes
pub const INT_MAX: u32 = 4_162_314_255;

/// Declared wire width of a number field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberWidth {
    Char = 1,
    Short = 2,
    Three = 3,
    Int = 4,
}

impl NumberWidth {
    /// Number of bytes the field occupies
    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Largest value representable at this width
    #[inline]
    pub const fn max(self) -> u32 {
        match self {
            Self::Char => CHAR_MAX,
            Self::Short => SHORT_MAX,
            Self::Three => THREE_MAX,
            Self::Int => INT_MAX,
        }
    }
}

/// Write a number using exactly `width` bytes
///
/// # Errors
/// [`EncodingError::OutOfRange`] when `value` exceeds `width.max()`.
/// Nothing is written in that case.
pub fn write_number(buf: &mut BytesMut, value: u32, width: NumberWidth) -> Result<(), EncodingError> {
    let digits = encode_number(value, width)?;
    buf.put_slice(&digits[..width.bytes()]);
    Ok(())
}

/// Encode a number into its digit bytes
///
/// Only the first `width.bytes()` entries of the returned array are used.
pub fn encode_number(value: u32, width: NumberWidth) -> Result<[u8; 4], EncodingError> {
    if value > width.max() {
        return Err(EncodingError::OutOfRange {
            value: value as u64,
            width: width.bytes(),
            max: width.max() as u64,
        });
    }

    let mut out = [0u8; 4];
    let mut remaining = value as u64;
    for slot in out[..width.bytes()].iter_mut().rev() {
        *slot = (remaining % NUMBER_BASE) as u8 + DIGIT_BIAS;
        remaining /= NUMBER_BASE;
    }

    Ok(out)
}

/// Decode a number from its digit bytes (1 to 4 bytes)
///
/// Offsets in the returned error are relative to `bytes`.
pub fn decode_number(bytes: &[u8]) -> Result<u32, EncodingError> {
    if bytes.is_empty() || bytes.len() > NumberWidth::Int.bytes() {
        return Err(EncodingError::UnexpectedEof {
            offset: 0,
            needed: 1,
            remaining: bytes.len(),
        });
    }

    let mut value: u64 = 0;
    for (offset, &byte) in bytes.iter().enumerate() {
        if byte < DIGIT_BIAS || byte == BREAK_BYTE {
            return Err(EncodingError::InvalidDigit { byte, offset });
        }
        value = value * NUMBER_BASE + (byte - DIGIT_BIAS) as u64;
    }

    // Four digits of base 254 always fit below INT_MAX
    Ok(value as u32)
}

/// Append a break string (text followed by [`BREAK_BYTE`])
#[inline]
pub fn write_break_string(buf: &mut BytesMut, text: &str) {
    buf.put_slice(text.as_bytes());
    buf.put_u8(BREAK_BYTE);
}

/// Pad `text` to a fixed field length with [`BREAK_BYTE`]
pub fn pad_fixed(text: &str, length: usize) -> Result<Vec<u8>, EncodingError> {
    let bytes = text.as_bytes();
    if bytes.len() > length {
        return Err(EncodingError::FieldTooLong {
            len: bytes.len(),
            max: length,
        });
    }

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(bytes);
    out.resize(length, BREAK_BYTE);
    Ok(out)
}

/// Encode a map string into a fixed-length field
///
/// The text is padded to `length`, each character is inverted and the whole
/// field is reversed.
pub fn encode_map_string(text: &str, length: usize) -> Result<Vec<u8>, EncodingError> {
    let mut bytes = pad_fixed(text, length)?;
    invert_characters(&mut bytes);
    bytes.reverse();
    Ok(bytes)
}

/// Decode a fixed-length map string field
pub fn decode_map_string(field: &[u8]) -> Result<String, EncodingError> {
    let mut bytes = field.to_vec();
    bytes.reverse();
    invert_characters(&mut bytes);

    let end = bytes.iter().position(|&b| b == BREAK_BYTE).unwrap_or(bytes.len());
    bytes.truncate(end);

    String::from_utf8(bytes).map_err(|e| EncodingError::InvalidText {
        offset: e.utf8_error().valid_up_to(),
    })
}

/// Apply the alternating character inversion used by map strings
///
/// Each position is mapped by an involution, so applying it twice with the
/// same length restores the input. `~` and bytes outside the printable range
/// pass through unchanged.
fn invert_characters(bytes: &mut [u8]) {
    let mut flippy = bytes.len() % 2 == 1;

    for byte in bytes.iter_mut() {
        let c = *byte;
        let pivot: u8 = if flippy {
            match c {
                0x22..=0x4F => 0x71,
                0x50..=0x7D => 0xCD,
                _ => 0,
            }
        } else {
            match c {
                0x22..=0x7D => 0x9F,
                _ => 0,
            }
        };

        if pivot != 0 {
            *byte = pivot - c;
        }
        flippy = !flippy;
    }
}

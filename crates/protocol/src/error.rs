//! Encoding errors for the EO number and string codecs

use eoclient_core::EoError;

/// Errors raised while encoding or decoding protocol primitives
///
/// Offsets are byte positions within the buffer being decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Value does not fit in the requested number width
    #[error("value {value} does not fit in {width} byte(s) (max {max})")]
    OutOfRange { value: u64, width: usize, max: u64 },

    /// A byte inside a number is not a valid digit (0x00 or 0xFF)
    #[error("invalid number byte 0x{byte:02X} at offset {offset}")]
    InvalidDigit { byte: u8, offset: usize },

    /// Input ended before a field was complete
    #[error("unexpected end of data at offset {offset}: needed {needed} byte(s), {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// String bytes are not valid UTF-8
    #[error("invalid text at offset {offset}")]
    InvalidText { offset: usize },

    /// String is longer than its fixed-width field
    #[error("string of {len} bytes exceeds field length {max}")]
    FieldTooLong { len: usize, max: usize },
}

impl EncodingError {
    /// Shift a relative offset so it points into the enclosing buffer
    pub(crate) fn offset_by(self, base: usize) -> Self {
        match self {
            Self::InvalidDigit { byte, offset } => Self::InvalidDigit {
                byte,
                offset: offset + base,
            },
            Self::UnexpectedEof {
                offset,
                needed,
                remaining,
            } => Self::UnexpectedEof {
                offset: offset + base,
                needed,
                remaining,
            },
            Self::InvalidText { offset } => Self::InvalidText {
                offset: offset + base,
            },
            other => other,
        }
    }

    /// Byte offset the error refers to, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::InvalidDigit { offset, .. }
            | Self::UnexpectedEof { offset, .. }
            | Self::InvalidText { offset } => Some(*offset),
            Self::OutOfRange { .. } | Self::FieldTooLong { .. } => None,
        }
    }
}

impl From<EncodingError> for EoError {
    fn from(err: EncodingError) -> Self {
        EoError::Encoding(err.to_string())
    }
}

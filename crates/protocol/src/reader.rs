//! Cursor over an encoded EO buffer

use crate::codecs::{decode_map_string, decode_number, NumberWidth, BREAK_BYTE};
use crate::error::EncodingError;

/// Sequential reader for EO-encoded data
///
/// Tracks the absolute byte offset so decoding errors can point at the
/// exact position in the source buffer.
#[derive(Debug, Clone)]
pub struct EoReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> EoReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without consuming it
    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    /// Unread bytes, without consuming them
    #[inline]
    pub fn peek_remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    /// Read one raw byte
    pub fn get_byte(&mut self) -> Result<u8, EncodingError> {
        Ok(self.get_bytes(1)?[0])
    }

    /// Read `len` raw bytes
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < len {
            return Err(EncodingError::UnexpectedEof {
                offset: self.position,
                needed: len,
                remaining: self.remaining(),
            });
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Read a number of the given width
    pub fn get_number(&mut self, width: NumberWidth) -> Result<u32, EncodingError> {
        let start = self.position;
        let bytes = self.get_bytes(width.bytes())?;
        decode_number(bytes).map_err(|e| e.offset_by(start))
    }

    /// Read a one-byte number
    #[inline]
    pub fn get_char(&mut self) -> Result<u8, EncodingError> {
        // CHAR_MAX fits in a u8
        Ok(self.get_number(NumberWidth::Char)? as u8)
    }

    /// Read a two-byte number
    #[inline]
    pub fn get_short(&mut self) -> Result<u16, EncodingError> {
        // SHORT_MAX fits in a u16
        Ok(self.get_number(NumberWidth::Short)? as u16)
    }

    /// Read a three-byte number
    #[inline]
    pub fn get_three(&mut self) -> Result<u32, EncodingError> {
        self.get_number(NumberWidth::Three)
    }

    /// Read a four-byte number
    #[inline]
    pub fn get_int(&mut self) -> Result<u32, EncodingError> {
        self.get_number(NumberWidth::Int)
    }

    /// Read bytes up to the next break byte or the end of the buffer
    ///
    /// The break byte itself is consumed but not returned.
    pub fn get_break_bytes(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        match rest.iter().position(|&b| b == BREAK_BYTE) {
            Some(end) => {
                self.position += end + 1;
                &rest[..end]
            }
            None => {
                self.position = self.data.len();
                rest
            }
        }
    }

    /// Read a break-terminated string
    pub fn get_break_string(&mut self) -> Result<String, EncodingError> {
        let start = self.position;
        let bytes = self.get_break_bytes();
        to_text(bytes, start)
    }

    /// Read everything that is left
    pub fn get_end_bytes(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }

    /// Read everything that is left as text
    pub fn get_end_string(&mut self) -> Result<String, EncodingError> {
        let start = self.position;
        let bytes = self.get_end_bytes();
        to_text(bytes, start)
    }

    /// Read a fixed-length string, optionally stripping break-byte padding
    pub fn get_fixed_string(&mut self, length: usize, padded: bool) -> Result<String, EncodingError> {
        let start = self.position;
        let mut bytes = self.get_bytes(length)?;
        if padded {
            if let Some(end) = bytes.iter().position(|&b| b == BREAK_BYTE) {
                bytes = &bytes[..end];
            }
        }
        to_text(bytes, start)
    }

    /// Read a fixed-length map string field
    pub fn get_map_string(&mut self, length: usize) -> Result<String, EncodingError> {
        let start = self.position;
        let bytes = self.get_bytes(length)?;
        decode_map_string(bytes).map_err(|e| e.offset_by(start))
    }
}

fn to_text(bytes: &[u8], start: usize) -> Result<String, EncodingError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| EncodingError::InvalidText {
        offset: start + e.utf8_error().valid_up_to(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_in_sequence() {
        // char 5, short 254, three 0
        let data = [6, 2, 1, 1, 1, 1];
        let mut reader = EoReader::new(&data);
        assert_eq!(reader.get_char().unwrap(), 5);
        assert_eq!(reader.get_short().unwrap(), 254);
        assert_eq!(reader.get_three().unwrap(), 0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_eof_reports_offset() {
        let data = [1, 1, 1];
        let mut reader = EoReader::new(&data);
        reader.get_short().unwrap();
        let err = reader.get_short().unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnexpectedEof {
                offset: 2,
                needed: 2,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_invalid_digit_offset_is_absolute() {
        let data = [1, 1, 0xFF];
        let mut reader = EoReader::new(&data);
        reader.get_char().unwrap();
        let err = reader.get_short().unwrap_err();
        assert_eq!(err, EncodingError::InvalidDigit { byte: 0xFF, offset: 2 });
    }

    #[test]
    fn test_break_strings() {
        let data = b"hello\xFFworld";
        let mut reader = EoReader::new(data);
        assert_eq!(reader.get_break_string().unwrap(), "hello");
        assert_eq!(reader.position(), 6);
        // No terminator: read to the end
        assert_eq!(reader.get_break_string().unwrap(), "world");
        assert!(reader.is_empty());
        assert_eq!(reader.get_break_string().unwrap(), "");
    }

    #[test]
    fn test_fixed_string_padding() {
        let data = b"ab\xFF\xFFcd";
        let mut reader = EoReader::new(data);
        assert_eq!(reader.get_fixed_string(4, true).unwrap(), "ab");
        assert_eq!(reader.get_fixed_string(2, false).unwrap(), "cd");
    }

    #[test]
    fn test_invalid_text() {
        let data = [b'o', b'k', 0xC3, 0x28, BREAK_BYTE];
        let mut reader = EoReader::new(&data);
        assert_eq!(
            reader.get_break_string().unwrap_err(),
            EncodingError::InvalidText { offset: 2 }
        );
    }
}

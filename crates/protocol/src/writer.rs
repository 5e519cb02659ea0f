//! Builder for EO-encoded buffers

use crate::codecs::{encode_map_string, pad_fixed, write_break_string, write_number, NumberWidth};
use crate::error::EncodingError;
use bytes::{BufMut, Bytes, BytesMut};

/// Append-only writer producing EO-encoded data
///
/// Number writes fail instead of saturating, so a successful write always
/// decodes back to the same value.
#[derive(Debug, Clone, Default)]
pub struct EoWriter {
    buf: BytesMut,
}

impl EoWriter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Append one raw byte
    #[inline]
    pub fn add_byte(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    /// Append raw bytes
    #[inline]
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Append a number of the given width
    #[inline]
    pub fn add_number(&mut self, value: u32, width: NumberWidth) -> Result<(), EncodingError> {
        write_number(&mut self.buf, value, width)
    }

    #[inline]
    pub fn add_char(&mut self, value: u8) -> Result<(), EncodingError> {
        self.add_number(value as u32, NumberWidth::Char)
    }

    #[inline]
    pub fn add_short(&mut self, value: u16) -> Result<(), EncodingError> {
        self.add_number(value as u32, NumberWidth::Short)
    }

    #[inline]
    pub fn add_three(&mut self, value: u32) -> Result<(), EncodingError> {
        self.add_number(value, NumberWidth::Three)
    }

    #[inline]
    pub fn add_int(&mut self, value: u32) -> Result<(), EncodingError> {
        self.add_number(value, NumberWidth::Int)
    }

    /// Append a list length as a two-byte number
    pub fn add_count(&mut self, count: usize) -> Result<(), EncodingError> {
        let value = u32::try_from(count).unwrap_or(u32::MAX);
        self.add_number(value, NumberWidth::Short)
    }

    /// Append text followed by the break byte
    #[inline]
    pub fn add_break_string(&mut self, text: &str) {
        write_break_string(&mut self.buf, text);
    }

    /// Append text without a terminator
    #[inline]
    pub fn add_string(&mut self, text: &str) {
        self.buf.put_slice(text.as_bytes());
    }

    /// Append a fixed-length string, padding with break bytes when `padded`
    pub fn add_fixed_string(&mut self, text: &str, length: usize, padded: bool) -> Result<(), EncodingError> {
        if padded {
            let field = pad_fixed(text, length)?;
            self.buf.put_slice(&field);
            return Ok(());
        }

        if text.len() != length {
            return Err(EncodingError::FieldTooLong {
                len: text.len(),
                max: length,
            });
        }
        self.buf.put_slice(text.as_bytes());
        Ok(())
    }

    /// Append a fixed-length map string field
    pub fn add_map_string(&mut self, text: &str, length: usize) -> Result<(), EncodingError> {
        let field = encode_map_string(text, length)?;
        self.buf.put_slice(&field);
        Ok(())
    }

    /// Overwrite already written bytes at `offset`
    ///
    /// Used to patch header fields once the rest of a buffer is known.
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) -> Result<(), EncodingError> {
        let end = offset + bytes.len();
        if end > self.buf.len() {
            return Err(EncodingError::UnexpectedEof {
                offset,
                needed: bytes.len(),
                remaining: self.buf.len().saturating_sub(offset),
            });
        }
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::EoReader;

    #[test]
    fn test_writer_reader_agree() {
        let mut writer = EoWriter::new();
        writer.add_char(7).unwrap();
        writer.add_short(5000).unwrap();
        writer.add_three(70_000).unwrap();
        writer.add_int(123_456_789).unwrap();
        writer.add_break_string("sign");
        writer.add_map_string("Aeven", 24).unwrap();

        let bytes = writer.into_vec();
        let mut reader = EoReader::new(&bytes);
        assert_eq!(reader.get_char().unwrap(), 7);
        assert_eq!(reader.get_short().unwrap(), 5000);
        assert_eq!(reader.get_three().unwrap(), 70_000);
        assert_eq!(reader.get_int().unwrap(), 123_456_789);
        assert_eq!(reader.get_break_string().unwrap(), "sign");
        assert_eq!(reader.get_map_string(24).unwrap(), "Aeven");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_char_overflow_is_rejected() {
        let mut writer = EoWriter::new();
        assert!(writer.add_char(254).is_err());
        assert!(writer.add_char(255).is_err());
        assert!(writer.is_empty());
    }

    #[test]
    fn test_count_overflow_is_rejected() {
        let mut writer = EoWriter::new();
        assert!(writer.add_count(64_515).is_ok());
        assert!(writer.add_count(64_516).is_err());
    }

    #[test]
    fn test_patch_header() {
        let mut writer = EoWriter::new();
        writer.add_int(0).unwrap();
        writer.add_char(1).unwrap();
        writer.patch(0, &[1, 1, 1, 2]).unwrap();
        assert_eq!(writer.as_slice(), &[1, 1, 1, 2, 2]);
        assert!(writer.patch(4, &[1, 1]).is_err());
    }
}

//! # Packet Builder
//!
//! Helper for assembling packet bodies with the EO codecs.
//!
//! ```rust
//! use eoclient_protocol::{PacketAction, PacketBuilder, PacketFamily};
//!
//! let mut builder = PacketBuilder::new(PacketFamily::Warp, PacketAction::Accept);
//! builder.add_short(5).unwrap();
//! builder.add_char(1).unwrap();
//! let packet = builder.build();
//! assert_eq!(packet.body.len(), 3);
//! ```

use crate::error::EncodingError;
use crate::packet_types::Packet;
use crate::packets::{PacketAction, PacketFamily};
use crate::writer::EoWriter;

/// Incrementally builds a [`Packet`]
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    family: PacketFamily,
    action: PacketAction,
    writer: EoWriter,
}

impl PacketBuilder {
    pub fn new(family: PacketFamily, action: PacketAction) -> Self {
        Self {
            family,
            action,
            writer: EoWriter::new(),
        }
    }

    #[inline]
    pub fn add_byte(&mut self, byte: u8) {
        self.writer.add_byte(byte);
    }

    #[inline]
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.writer.add_bytes(bytes);
    }

    #[inline]
    pub fn add_char(&mut self, value: u8) -> Result<(), EncodingError> {
        self.writer.add_char(value)
    }

    #[inline]
    pub fn add_short(&mut self, value: u16) -> Result<(), EncodingError> {
        self.writer.add_short(value)
    }

    #[inline]
    pub fn add_three(&mut self, value: u32) -> Result<(), EncodingError> {
        self.writer.add_three(value)
    }

    #[inline]
    pub fn add_int(&mut self, value: u32) -> Result<(), EncodingError> {
        self.writer.add_int(value)
    }

    #[inline]
    pub fn add_break_string(&mut self, text: &str) {
        self.writer.add_break_string(text);
    }

    #[inline]
    pub fn add_string(&mut self, text: &str) {
        self.writer.add_string(text);
    }

    /// Number of body bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Finish the packet
    pub fn build(self) -> Packet {
        Packet::new(self.family, self.action, self.writer.into_bytes())
    }
}

//! # Packet Structure
//!
//! A decoded packet as handed over by the transport layer: two raw
//! identifier bytes followed by an EO-encoded body.
//!
//! ```text
//! {action: u8}{family: u8}{body ...}
//! ```
//!
//! Framing (length prefixes) and encryption are handled by the transport and
//! never reach this type.

use crate::error::EncodingError;
use crate::packets::{PacketAction, PacketFamily, PacketKey};
use crate::reader::EoReader;
use bytes::{BufMut, Bytes, BytesMut};

/// A single protocol message
///
/// Cloning is cheap: the body is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Message category
    pub family: PacketFamily,

    /// Message verb
    pub action: PacketAction,

    /// Encoded body (excluding the identifier bytes)
    pub body: Bytes,
}

impl Packet {
    /// Create a packet from its parts
    #[inline]
    pub fn new(family: PacketFamily, action: PacketAction, body: impl Into<Bytes>) -> Self {
        Self {
            family,
            action,
            body: body.into(),
        }
    }

    /// Decode a packet from a de-framed buffer
    ///
    /// # Errors
    /// [`EncodingError::UnexpectedEof`] when the buffer is shorter than the
    /// two identifier bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EncodingError> {
        if data.len() < 2 {
            return Err(EncodingError::UnexpectedEof {
                offset: 0,
                needed: 2,
                remaining: data.len(),
            });
        }

        Ok(Self {
            action: PacketAction::from_u8(data[0]),
            family: PacketFamily::from_u8(data[1]),
            body: Bytes::copy_from_slice(&data[2..]),
        })
    }

    /// Encode the packet (identifiers followed by the body)
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.body.len() + 2);
        buf.put_u8(self.action.as_u8());
        buf.put_u8(self.family.as_u8());
        buf.put_slice(&self.body);
        buf.freeze()
    }

    /// Routing key of this packet
    #[inline]
    pub fn key(&self) -> PacketKey {
        PacketKey::new(self.family, self.action)
    }

    /// Reader positioned at the start of the body
    #[inline]
    pub fn reader(&self) -> EoReader<'_> {
        EoReader::new(&self.body)
    }
}

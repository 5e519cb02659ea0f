//! # EOClient Protocol Library
//!
//! Encoding primitives and packet types for the Endless Online wire protocol.
//!
//! ## Architecture
//!
//! ### 1. Codecs Layer ([`codecs`])
//! Variable-width number encoding shared by packets and map files:
//! - Char: 1 byte (max 253)
//! - Short: 2 bytes (max 64515)
//! - Three: 3 bytes (max 16387063)
//! - Int: 4 bytes (max 4162314255)
//! - Break strings terminated by `0xFF`
//! - Fixed-width map strings
//!
//! ### 2. Reader / Writer ([`reader`], [`writer`])
//! Cursor types that track byte offsets for error reporting.
//!
//! ### 3. Packets ([`packets`], [`packet_types`], [`packet_builder`])
//! Family/action identifiers, the [`Packet`] value and a builder.
//!
//! ## Overflow Policy
//!
//! Writing a number larger than its field width fails with
//! [`EncodingError::OutOfRange`]. Values are never clamped.

pub mod codecs;
pub mod error;
pub mod reader;
pub mod writer;
pub mod packets;
pub mod packet_types;
pub mod packet_builder;

// Re-export commonly used items
pub use codecs::*;
pub use error::EncodingError;
pub use reader::EoReader;
pub use writer::EoWriter;
pub use packets::*;
pub use packet_types::Packet;
pub use packet_builder::PacketBuilder;

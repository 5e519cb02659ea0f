//! # EOClient Maps
//!
//! This crate handles the `.emf` map file format: the in-memory entity model,
//! the binary codec and on-disk loading and caching.
//!
//! ## Features
//! - Immutable [`MapFile`] aggregate with functional `with_*` updates
//! - Run-length encoded tile and graphic layers
//! - Warps, NPC spawns, chests and signs
//! - Opaque unknown blocks preserved for byte-identical round-trips
//! - Checksum-based cache invalidation
//!
//! ## Map Format
//!
//! Sections are stored in a fixed order:
//! - **Header**: magic `EMF` and checksum
//! - **Properties**: id, name, dimensions, music, flags
//! - **Tiles** and the nine **GFX** layers, one run-length row per map row
//! - **Warps**, **NPC spawns**, **unknown blocks**, **chests**, **signs**
//! - Any trailing bytes

pub mod error;
pub mod entities;
pub mod properties;
pub mod matrix;
pub mod map_file;
pub mod codec;
pub mod loader;
pub mod cache;

pub use error::{FormatErrorKind, MapError, MapFormatError, MapSection, Result};
pub use entities::{
    ChestSpawnMapEntity, DoorSpec, MapEffect, MapLayer, MapType, NpcSpawnMapEntity, SignMapEntity,
    TileSpec, WarpMapEntity,
};
pub use properties::MapFileProperties;
pub use matrix::{Matrix, SparseMatrix};
pub use map_file::MapFile;
pub use codec::MapFileSerializer;
pub use loader::MapFileLoader;
pub use cache::{CacheStats, MapCache};

//! Error types for the maps crate

use crate::entities::MapLayer;
use eoclient_core::EoError;
use eoclient_protocol::EncodingError;
use std::fmt;

/// Section of a map file being decoded when a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSection {
    Header,
    Properties,
    Tiles,
    Gfx(MapLayer),
    Warps,
    NpcSpawns,
    Unknowns,
    Chests,
    Signs,
}

impl fmt::Display for MapSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Properties => f.write_str("properties"),
            Self::Tiles => f.write_str("tiles"),
            Self::Gfx(layer) => write!(f, "gfx ({})", layer.name()),
            Self::Warps => f.write_str("warps"),
            Self::NpcSpawns => f.write_str("npc spawns"),
            Self::Unknowns => f.write_str("unknowns"),
            Self::Chests => f.write_str("chests"),
            Self::Signs => f.write_str("signs"),
        }
    }
}

/// What went wrong inside a section
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatErrorKind {
    #[error("bad magic {0:?}, expected \"EMF\"")]
    BadMagic([u8; 3]),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("row is missing its terminator")]
    UnterminatedRow,

    #[error("string is missing its terminator")]
    UnterminatedString,

    #[error("coordinate ({x}, {y}) is outside the map (width {width}, height {height})")]
    OutOfRange { x: u8, y: u8, width: u8, height: u8 },

    #[error("run at x={x} does not come after x={previous}")]
    UnorderedRun { x: u8, previous: u8 },

    #[error("more than one warp at ({x}, {y})")]
    DuplicateWarp { x: u8, y: u8 },

    #[error("invalid flag value {0}")]
    InvalidFlag(u8),
}

/// Structured failure produced when decoding a map file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {section} section at offset {offset}: {kind}")]
pub struct MapFormatError {
    pub section: MapSection,
    pub offset: usize,
    pub kind: FormatErrorKind,
}

/// Map-specific error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// File I/O error
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    /// Map file could not be decoded
    #[error("Invalid map format: {0}")]
    Format(#[from] MapFormatError),

    /// A value does not fit its field when encoding
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Coordinate outside the map bounds
    #[error("Coordinate ({x}, {y}) is outside the map (width {width}, height {height})")]
    OutOfBounds { x: u8, y: u8, width: u8, height: u8 },

    /// Map not found
    #[error("Map not found: {0}")]
    NotFound(String),
}

impl From<MapError> for EoError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::FileError(e) => EoError::Io(e),
            MapError::Format(e) => EoError::MapFormat(e.to_string()),
            MapError::Encoding(e) => EoError::Encoding(e.to_string()),
            MapError::NotFound(name) => EoError::NotFound(name),
            other => EoError::InvalidData(other.to_string()),
        }
    }
}

/// Result type for map operations
pub type Result<T> = std::result::Result<T, MapError>;

//! Map files on disk
//!
//! Maps live in a flat directory named by id, e.g. `00005.emf`.

use crate::codec::MapFileSerializer;
use crate::map_file::MapFile;
use crate::{MapError, Result};
use eoclient_core::MapId;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// File extension used for maps
pub const MAP_EXTENSION: &str = "emf";

/// Map file loader
pub struct MapFileLoader;

impl MapFileLoader {
    /// File name for a map id
    pub fn file_name(map_id: MapId) -> String {
        format!("{:05}.{}", map_id.get(), MAP_EXTENSION)
    }

    /// Map id encoded in a file name, if it follows the naming scheme
    pub fn map_id_from_path<P: AsRef<Path>>(path: P) -> Option<MapId> {
        let path = path.as_ref();
        if path.extension()?.to_str()? != MAP_EXTENSION {
            return None;
        }
        path.file_stem()?.to_str()?.parse::<u16>().ok().map(MapId::new)
    }

    /// Load a map from a file
    ///
    /// When the file name carries a different id than the one stored in the
    /// file, the stored id wins and a warning is logged.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<MapFile> {
        let path = path.as_ref();

        let data = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MapError::NotFound(path.display().to_string()),
            _ => MapError::FileError(e),
        })?;

        let map = MapFileSerializer::deserialize(&data)?;
        let stored_id = map.properties().map_id();

        if let Some(named_id) = Self::map_id_from_path(path) {
            if named_id != stored_id {
                tracing::warn!(
                    "Map file {} is named for map {} but contains map {}",
                    path.display(),
                    named_id,
                    stored_id
                );
            }
        }

        tracing::debug!(
            "Loaded map {} \"{}\" ({}x{}, {} warps) from {}",
            stored_id,
            map.properties().name(),
            map.properties().columns(),
            map.properties().rows(),
            map.warps().len(),
            path.display()
        );

        Ok(map)
    }

    /// Save a map to a file
    ///
    /// The map is written next to the target and renamed into place, so a
    /// reader never sees a partially written file.
    pub fn save_file<P: AsRef<Path>>(path: P, map: &MapFile) -> Result<()> {
        let path = path.as_ref();
        let data = MapFileSerializer::serialize(map)?;

        let temp_path = path.with_extension("emf.tmp");
        fs::write(&temp_path, &data)?;
        fs::rename(&temp_path, path)?;

        tracing::debug!("Saved map {} to {}", map.properties().map_id(), path.display());
        Ok(())
    }
}

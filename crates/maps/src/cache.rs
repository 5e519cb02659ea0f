//! Map cache
//!
//! Keeps decoded maps in memory, loads them lazily from the maps directory
//! and answers whether a server-announced checksum matches the local copy.

use crate::codec::MapFileSerializer;
use crate::loader::MapFileLoader;
use crate::map_file::MapFile;
use crate::Result;
use dashmap::DashMap;
use eoclient_core::MapId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct CacheEntry {
    map: Arc<MapFile>,

    /// Seconds since UNIX epoch
    loaded_at: u64,
}

/// Cache of decoded maps, safe to share between tasks
pub struct MapCache {
    cache: DashMap<MapId, CacheEntry>,
    maps_dir: PathBuf,
}

impl MapCache {
    pub fn new<P: AsRef<Path>>(maps_dir: P) -> Self {
        Self {
            cache: DashMap::new(),
            maps_dir: maps_dir.as_ref().to_path_buf(),
        }
    }

    pub fn maps_dir(&self) -> &Path {
        &self.maps_dir
    }

    /// Path a map is stored at
    pub fn path_for(&self, map_id: MapId) -> PathBuf {
        self.maps_dir.join(MapFileLoader::file_name(map_id))
    }

    /// Get a map from the cache or load it from disk
    pub async fn get(&self, map_id: MapId) -> Result<Arc<MapFile>> {
        if let Some(entry) = self.cache.get(&map_id) {
            return Ok(Arc::clone(&entry.map));
        }

        self.load_map(map_id).await
    }

    /// Cached map, without touching the disk
    pub fn cached(&self, map_id: MapId) -> Option<Arc<MapFile>> {
        self.cache.get(&map_id).map(|entry| Arc::clone(&entry.map))
    }

    async fn load_map(&self, map_id: MapId) -> Result<Arc<MapFile>> {
        let path = self.path_for(map_id);
        let map = tokio::task::spawn_blocking(move || MapFileLoader::load_file(&path))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))??;

        Ok(self.insert(map))
    }

    /// Put a map into the cache under its stored id
    pub fn insert(&self, map: MapFile) -> Arc<MapFile> {
        let map_id = map.properties().map_id();
        let map = Arc::new(map);
        self.cache.insert(
            map_id,
            CacheEntry {
                map: Arc::clone(&map),
                loaded_at: Self::current_time(),
            },
        );
        map
    }

    /// Whether the cached copy of a map has the given checksum
    ///
    /// Maps that are not cached are never current.
    pub fn is_current(&self, map_id: MapId, checksum: u32) -> bool {
        self.cache
            .get(&map_id)
            .map(|entry| entry.map.properties().checksum() == checksum)
            .unwrap_or(false)
    }

    /// Store a map received from the server
    ///
    /// The bytes are decoded first, so a corrupt download leaves both the
    /// cache and the file on disk untouched.
    pub async fn store_downloaded(&self, data: &[u8]) -> Result<Arc<MapFile>> {
        let map = MapFileSerializer::deserialize(data)?;
        let map_id = map.properties().map_id();

        tokio::fs::create_dir_all(&self.maps_dir).await?;
        let path = self.path_for(map_id);
        let temp_path = path.with_extension("emf.tmp");
        tokio::fs::write(&temp_path, data).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        tracing::info!(
            "Stored downloaded map {} \"{}\" ({} bytes)",
            map_id,
            map.properties().name(),
            data.len()
        );

        Ok(self.insert(map))
    }

    /// Reload a map from disk
    pub async fn reload(&self, map_id: MapId) -> Result<Arc<MapFile>> {
        self.invalidate(map_id);
        self.load_map(map_id).await
    }

    /// Drop a map from the cache; returns whether it was cached
    pub fn invalidate(&self, map_id: MapId) -> bool {
        self.cache.remove(&map_id).is_some()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let mut oldest_load = u64::MAX;
        let mut newest_load = 0;

        for entry in self.cache.iter() {
            oldest_load = oldest_load.min(entry.loaded_at);
            newest_load = newest_load.max(entry.loaded_at);
        }

        CacheStats {
            num_maps: self.cache.len(),
            oldest_load_secs: if self.cache.is_empty() { 0 } else { oldest_load },
            newest_load_secs: newest_load,
        }
    }

    fn current_time() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub num_maps: usize,

    /// Oldest load time (seconds since epoch)
    pub oldest_load_secs: u64,

    /// Newest load time (seconds since epoch)
    pub newest_load_secs: u64,
}

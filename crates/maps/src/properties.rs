//! Map-wide properties

use crate::entities::{MapEffect, MapType};
use eoclient_core::MapId;
use serde::{Deserialize, Serialize};

/// Header and property block of a map file
///
/// `width` and `height` are the largest valid x and y, so a map with
/// `width == 0` still has one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFileProperties {
    map_id: MapId,
    checksum: u32,
    name: String,
    map_type: MapType,
    effect: MapEffect,
    music: u8,
    music_control: u8,
    ambient_noise: u16,
    width: u8,
    height: u8,
    fill_tile: u16,
    map_available: bool,
    can_scroll: bool,
    relog_x: u8,
    relog_y: u8,
}

impl Default for MapFileProperties {
    fn default() -> Self {
        Self {
            map_id: MapId::new(0),
            checksum: 0,
            name: String::new(),
            map_type: MapType::Normal,
            effect: MapEffect::None,
            music: 0,
            music_control: 0,
            ambient_noise: 0,
            width: 0,
            height: 0,
            fill_tile: 0,
            map_available: true,
            can_scroll: true,
            relog_x: 0,
            relog_y: 0,
        }
    }
}

impl MapFileProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn effect(&self) -> MapEffect {
        self.effect
    }

    pub fn music(&self) -> u8 {
        self.music
    }

    pub fn music_control(&self) -> u8 {
        self.music_control
    }

    pub fn ambient_noise(&self) -> u16 {
        self.ambient_noise
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of rows in the tile and graphic layers
    pub fn rows(&self) -> usize {
        self.height as usize + 1
    }

    /// Number of columns in the tile and graphic layers
    pub fn columns(&self) -> usize {
        self.width as usize + 1
    }

    pub fn fill_tile(&self) -> u16 {
        self.fill_tile
    }

    pub fn map_available(&self) -> bool {
        self.map_available
    }

    pub fn can_scroll(&self) -> bool {
        self.can_scroll
    }

    /// Where players reappear after reconnecting on this map
    pub fn relog_position(&self) -> (u8, u8) {
        (self.relog_x, self.relog_y)
    }

    pub fn with_map_id(mut self, map_id: MapId) -> Self {
        self.map_id = map_id;
        self
    }

    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = map_type;
        self
    }

    pub fn with_effect(mut self, effect: MapEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_music(mut self, music: u8, music_control: u8) -> Self {
        self.music = music;
        self.music_control = music_control;
        self
    }

    pub fn with_ambient_noise(mut self, ambient_noise: u16) -> Self {
        self.ambient_noise = ambient_noise;
        self
    }

    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fill_tile(mut self, fill_tile: u16) -> Self {
        self.fill_tile = fill_tile;
        self
    }

    pub fn with_map_available(mut self, available: bool) -> Self {
        self.map_available = available;
        self
    }

    pub fn with_can_scroll(mut self, can_scroll: bool) -> Self {
        self.can_scroll = can_scroll;
        self
    }

    pub fn with_relog_position(mut self, x: u8, y: u8) -> Self {
        self.relog_x = x;
        self.relog_y = y;
        self
    }
}

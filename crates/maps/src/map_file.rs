//! The map file aggregate

use crate::codec::{MapFileSerializer, CHECKSUM_OFFSET};
use crate::entities::{
    ChestSpawnMapEntity, MapLayer, NpcSpawnMapEntity, SignMapEntity, TileSpec, WarpMapEntity,
};
use crate::error::{MapError, Result};
use crate::matrix::{Matrix, SparseMatrix};
use crate::properties::MapFileProperties;
use eoclient_core::MapCoordinate;
use eoclient_protocol::{encode_number, NumberWidth, INT_MAX};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Default graphic id for cells without a run
pub const EMPTY_GFX: u16 = 0;

/// A complete map
///
/// Values are immutable; every `with_*` method consumes the map and returns
/// the updated copy. Layer storage is shared between copies until one of
/// them changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapFile {
    properties: MapFileProperties,
    tiles: Matrix<TileSpec>,
    gfx: BTreeMap<MapLayer, Matrix<u16>>,
    warps: SparseMatrix<WarpMapEntity>,
    npc_spawns: Vec<NpcSpawnMapEntity>,
    unknowns: Vec<Vec<u8>>,
    chests: Vec<ChestSpawnMapEntity>,
    signs: Vec<SignMapEntity>,
    trailing_bytes: Vec<u8>,
}

impl Default for MapFile {
    fn default() -> Self {
        Self::new(MapFileProperties::default())
    }
}

impl MapFile {
    /// Empty map sized from `properties`
    pub fn new(properties: MapFileProperties) -> Self {
        let rows = properties.rows();
        let cols = properties.columns();
        let gfx = MapLayer::ALL
            .iter()
            .map(|layer| (*layer, Matrix::new(rows, cols, EMPTY_GFX)))
            .collect();

        Self {
            tiles: Matrix::new(rows, cols, TileSpec::None),
            gfx,
            warps: SparseMatrix::new(rows, cols),
            npc_spawns: Vec::new(),
            unknowns: Vec::new(),
            chests: Vec::new(),
            signs: Vec::new(),
            trailing_bytes: Vec::new(),
            properties,
        }
    }

    /// Assemble a decoded map; the codec guarantees the parts agree
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        properties: MapFileProperties,
        tiles: Matrix<TileSpec>,
        gfx: BTreeMap<MapLayer, Matrix<u16>>,
        warps: SparseMatrix<WarpMapEntity>,
        npc_spawns: Vec<NpcSpawnMapEntity>,
        unknowns: Vec<Vec<u8>>,
        chests: Vec<ChestSpawnMapEntity>,
        signs: Vec<SignMapEntity>,
        trailing_bytes: Vec<u8>,
    ) -> Self {
        Self {
            properties,
            tiles,
            gfx,
            warps,
            npc_spawns,
            unknowns,
            chests,
            signs,
            trailing_bytes,
        }
    }

    /// Decode a map from its file bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        MapFileSerializer::deserialize(data)
    }

    /// Encode the map to file bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        MapFileSerializer::serialize(self)
    }

    pub fn properties(&self) -> &MapFileProperties {
        &self.properties
    }

    pub fn tiles(&self) -> &Matrix<TileSpec> {
        &self.tiles
    }

    pub fn tile_at(&self, x: u8, y: u8) -> Option<TileSpec> {
        self.tiles.get(x as usize, y as usize).copied()
    }

    pub fn gfx(&self, layer: MapLayer) -> &Matrix<u16> {
        &self.gfx[&layer]
    }

    /// All graphic layers in file order
    pub fn gfx_layers(&self) -> impl Iterator<Item = (MapLayer, &Matrix<u16>)> + '_ {
        self.gfx.iter().map(|(layer, grid)| (*layer, grid))
    }

    pub fn gfx_at(&self, layer: MapLayer, x: u8, y: u8) -> Option<u16> {
        self.gfx(layer).get(x as usize, y as usize).copied()
    }

    pub fn warps(&self) -> &SparseMatrix<WarpMapEntity> {
        &self.warps
    }

    pub fn warp_at(&self, x: u8, y: u8) -> Option<&WarpMapEntity> {
        self.warps.get(MapCoordinate::new(x, y))
    }

    pub fn npc_spawns(&self) -> &[NpcSpawnMapEntity] {
        &self.npc_spawns
    }

    /// Opaque blocks kept only so the file round-trips
    pub fn unknowns(&self) -> &[Vec<u8>] {
        &self.unknowns
    }

    pub fn chests(&self) -> &[ChestSpawnMapEntity] {
        &self.chests
    }

    pub fn signs(&self) -> &[SignMapEntity] {
        &self.signs
    }

    pub fn sign_at(&self, x: u8, y: u8) -> Option<&SignMapEntity> {
        self.signs.iter().find(|sign| sign.x == x && sign.y == y)
    }

    /// Bytes found after the last section
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.trailing_bytes
    }

    fn check_bounds(&self, at: MapCoordinate) -> Result<()> {
        let width = self.properties.width();
        let height = self.properties.height();
        if at.is_within(width, height) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds {
                x: at.x,
                y: at.y,
                width,
                height,
            })
        }
    }

    /// Replace the properties
    ///
    /// If the dimensions change, every layer is resized keeping the
    /// overlapping cells, and entities that no longer fit are dropped.
    pub fn with_properties(mut self, properties: MapFileProperties) -> Self {
        let rows = properties.rows();
        let cols = properties.columns();
        let (width, height) = (properties.width(), properties.height());

        if rows != self.tiles.rows() || cols != self.tiles.cols() {
            self.tiles = self.tiles.resized(rows, cols, TileSpec::None);
            for grid in self.gfx.values_mut() {
                *grid = grid.resized(rows, cols, EMPTY_GFX);
            }
            self.warps = self.warps.resized(rows, cols);
            self.npc_spawns.retain(|npc| npc.position().is_within(width, height));
            self.chests.retain(|chest| chest.position().is_within(width, height));
            self.signs.retain(|sign| sign.position().is_within(width, height));
        }

        self.properties = properties;
        self
    }

    pub fn with_tile(mut self, x: u8, y: u8, spec: TileSpec) -> Result<Self> {
        self.check_bounds(MapCoordinate::new(x, y))?;
        self.tiles.set(x as usize, y as usize, spec);
        Ok(self)
    }

    pub fn with_gfx(mut self, layer: MapLayer, x: u8, y: u8, gfx: u16) -> Result<Self> {
        self.check_bounds(MapCoordinate::new(x, y))?;
        if let Some(grid) = self.gfx.get_mut(&layer) {
            grid.set(x as usize, y as usize, gfx);
        }
        Ok(self)
    }

    /// Place a warp, replacing any warp already on that tile
    pub fn with_warp(mut self, warp: WarpMapEntity) -> Result<Self> {
        self.check_bounds(warp.position())?;
        self.warps.insert(warp.position(), warp);
        Ok(self)
    }

    pub fn without_warp(mut self, x: u8, y: u8) -> Self {
        self.warps.remove(MapCoordinate::new(x, y));
        self
    }

    pub fn with_npc_spawn(mut self, npc: NpcSpawnMapEntity) -> Result<Self> {
        self.check_bounds(npc.position())?;
        self.npc_spawns.push(npc);
        Ok(self)
    }

    pub fn with_npc_spawns(mut self, npcs: Vec<NpcSpawnMapEntity>) -> Result<Self> {
        for npc in &npcs {
            self.check_bounds(npc.position())?;
        }
        self.npc_spawns = npcs;
        Ok(self)
    }

    pub fn with_chest(mut self, chest: ChestSpawnMapEntity) -> Result<Self> {
        self.check_bounds(chest.position())?;
        self.chests.push(chest);
        Ok(self)
    }

    pub fn with_chests(mut self, chests: Vec<ChestSpawnMapEntity>) -> Result<Self> {
        for chest in &chests {
            self.check_bounds(chest.position())?;
        }
        self.chests = chests;
        Ok(self)
    }

    pub fn with_sign(mut self, sign: SignMapEntity) -> Result<Self> {
        self.check_bounds(sign.position())?;
        self.signs.push(sign);
        Ok(self)
    }

    pub fn with_signs(mut self, signs: Vec<SignMapEntity>) -> Result<Self> {
        for sign in &signs {
            self.check_bounds(sign.position())?;
        }
        self.signs = signs;
        Ok(self)
    }

    pub fn with_unknown(mut self, block: Vec<u8>) -> Self {
        self.unknowns.push(block);
        self
    }

    pub fn with_unknowns(mut self, unknowns: Vec<Vec<u8>>) -> Self {
        self.unknowns = unknowns;
        self
    }

    pub fn with_trailing_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.trailing_bytes = bytes;
        self
    }

    /// Checksum of the map content
    ///
    /// SHA-256 over the encoded file with the checksum field zeroed, reduced
    /// to the range of a four-byte number. The stored checksum does not
    /// affect the result.
    pub fn compute_checksum(&self) -> Result<u32> {
        let mut bytes = self.to_bytes()?;
        let zero = encode_number(0, NumberWidth::Int)?;
        bytes[CHECKSUM_OFFSET..CHECKSUM_OFFSET + NumberWidth::Int.bytes()]
            .copy_from_slice(&zero[..NumberWidth::Int.bytes()]);

        let digest = Sha256::digest(&bytes);
        let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Ok((prefix as u64 % (INT_MAX as u64 + 1)) as u32)
    }

    /// Copy with the stored checksum replaced by [`compute_checksum`](Self::compute_checksum)
    pub fn with_computed_checksum(self) -> Result<Self> {
        let checksum = self.compute_checksum()?;
        let properties = self.properties.clone().with_checksum(checksum);
        Ok(self.with_properties(properties))
    }

    /// Whether the stored checksum matches the content
    pub fn verify_checksum(&self) -> Result<bool> {
        Ok(self.compute_checksum()? == self.properties.checksum())
    }
}

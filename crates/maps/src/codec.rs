//! Binary `.emf` codec
//!
//! Layer rows are run-length encoded: each row is a list of `(x, value)`
//! runs closed by the break byte. A run covers its column up to the next
//! run in the row; columns before the first run keep the layer default.
//! Encoding is canonical: a run is written only where the value changes,
//! so equal neighbours always share one run.

use crate::entities::{
    ChestSpawnMapEntity, DoorSpec, MapEffect, MapLayer, MapType, NpcSpawnMapEntity, SignMapEntity,
    TileSpec, WarpMapEntity,
};
use crate::error::{FormatErrorKind, MapError, MapFormatError, MapSection, Result};
use crate::map_file::{MapFile, EMPTY_GFX};
use crate::matrix::{Matrix, SparseMatrix};
use crate::properties::MapFileProperties;
use eoclient_core::{MapCoordinate, MapId};
use eoclient_protocol::{EncodingError, EoReader, EoWriter, BREAK_BYTE};
use std::collections::BTreeMap;

/// File signature
pub const MAGIC: &[u8; 3] = b"EMF";

/// Byte offset of the checksum field
pub const CHECKSUM_OFFSET: usize = 3;

/// Encoded length of the map name field
pub const NAME_LENGTH: usize = 24;

/// Reads and writes [`MapFile`] values
pub struct MapFileSerializer;

impl MapFileSerializer {
    /// Encode a map
    ///
    /// Fails with [`MapError::Encoding`] when a value does not fit its field.
    pub fn serialize(map: &MapFile) -> Result<Vec<u8>> {
        let props = map.properties();
        let mut w = EoWriter::with_capacity(estimate_size(map));

        w.add_bytes(MAGIC);
        w.add_int(props.checksum())?;

        w.add_short(props.map_id().get())?;
        w.add_map_string(props.name(), NAME_LENGTH)?;
        w.add_char(props.map_type().code())?;
        w.add_char(props.effect().code())?;
        w.add_char(props.music())?;
        w.add_char(props.music_control())?;
        w.add_short(props.ambient_noise())?;
        w.add_char(props.width())?;
        w.add_char(props.height())?;
        w.add_short(props.fill_tile())?;
        w.add_char(props.map_available() as u8)?;
        w.add_char(props.can_scroll() as u8)?;
        let (relog_x, relog_y) = props.relog_position();
        w.add_char(relog_x)?;
        w.add_char(relog_y)?;

        write_layer(&mut w, map.tiles(), TileSpec::None, |w, spec| w.add_char(spec.code()))?;
        for layer in MapLayer::ALL {
            write_layer(&mut w, map.gfx(layer), EMPTY_GFX, |w, gfx| w.add_short(*gfx))?;
        }

        w.add_count(map.warps().len())?;
        for warp in map.warps().values() {
            w.add_char(warp.x)?;
            w.add_char(warp.y)?;
            w.add_short(warp.destination_map)?;
            w.add_char(warp.destination_x)?;
            w.add_char(warp.destination_y)?;
            w.add_char(warp.level_required)?;
            w.add_short(warp.door.code())?;
        }

        w.add_count(map.npc_spawns().len())?;
        for npc in map.npc_spawns() {
            w.add_char(npc.x)?;
            w.add_char(npc.y)?;
            w.add_short(npc.id)?;
            w.add_char(npc.spawn_type)?;
            w.add_short(npc.respawn_time)?;
            w.add_char(npc.amount)?;
        }

        w.add_count(map.unknowns().len())?;
        for block in map.unknowns() {
            w.add_count(block.len())?;
            w.add_bytes(block);
        }

        w.add_count(map.chests().len())?;
        for chest in map.chests() {
            w.add_char(chest.x)?;
            w.add_char(chest.y)?;
            w.add_short(chest.key)?;
            w.add_char(chest.slot)?;
            w.add_short(chest.item_id)?;
            w.add_short(chest.respawn_time)?;
            w.add_three(chest.amount)?;
        }

        w.add_count(map.signs().len())?;
        for sign in map.signs() {
            w.add_char(sign.x)?;
            w.add_char(sign.y)?;
            w.add_break_string(&sign.title);
            w.add_break_string(&sign.message);
        }

        w.add_bytes(map.trailing_bytes());
        Ok(w.into_vec())
    }

    /// Decode a map
    ///
    /// Either the whole map decodes or a [`MapFormatError`] is returned
    /// naming the section and byte offset of the first problem.
    pub fn deserialize(data: &[u8]) -> Result<MapFile> {
        let mut r = SectionReader::new(data);

        let magic = r.bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(r.error_at(0, FormatErrorKind::BadMagic([magic[0], magic[1], magic[2]])));
        }
        let checksum = r.int()?;

        r.enter(MapSection::Properties);
        let map_id = r.short()?;
        let name = r.map_string(NAME_LENGTH)?;
        let map_type = MapType::from_code(r.char()?);
        let effect = MapEffect::from_code(r.char()?);
        let music = r.char()?;
        let music_control = r.char()?;
        let ambient_noise = r.short()?;
        let width = r.char()?;
        let height = r.char()?;
        let fill_tile = r.short()?;
        let map_available = r.flag()?;
        let can_scroll = r.flag()?;
        let relog_x = r.char()?;
        let relog_y = r.char()?;

        let properties = MapFileProperties::new()
            .with_map_id(MapId::new(map_id))
            .with_checksum(checksum)
            .with_name(name)
            .with_map_type(map_type)
            .with_effect(effect)
            .with_music(music, music_control)
            .with_ambient_noise(ambient_noise)
            .with_size(width, height)
            .with_fill_tile(fill_tile)
            .with_map_available(map_available)
            .with_can_scroll(can_scroll)
            .with_relog_position(relog_x, relog_y);
        let bounds = Bounds { width, height };

        r.enter(MapSection::Tiles);
        let tiles = read_layer(&mut r, bounds, TileSpec::None, |r| {
            Ok(TileSpec::from_code(r.char()?))
        })?;

        let mut gfx = BTreeMap::new();
        for layer in MapLayer::ALL {
            r.enter(MapSection::Gfx(layer));
            gfx.insert(layer, read_layer(&mut r, bounds, EMPTY_GFX, |r| r.short())?);
        }

        r.enter(MapSection::Warps);
        let mut warps = SparseMatrix::new(bounds.rows(), bounds.cols());
        for _ in 0..r.short()? {
            let start = r.position();
            let warp = WarpMapEntity {
                x: r.char()?,
                y: r.char()?,
                destination_map: r.short()?,
                destination_x: r.char()?,
                destination_y: r.char()?,
                level_required: r.char()?,
                door: DoorSpec::from_code(r.short()?),
            };
            r.check_position(start, bounds, warp.position())?;
            if warps.contains(warp.position()) {
                return Err(r.error_at(
                    start,
                    FormatErrorKind::DuplicateWarp { x: warp.x, y: warp.y },
                ));
            }
            warps.insert(warp.position(), warp);
        }

        r.enter(MapSection::NpcSpawns);
        let count = r.short()?;
        let mut npc_spawns = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = r.position();
            let npc = NpcSpawnMapEntity {
                x: r.char()?,
                y: r.char()?,
                id: r.short()?,
                spawn_type: r.char()?,
                respawn_time: r.short()?,
                amount: r.char()?,
            };
            r.check_position(start, bounds, npc.position())?;
            npc_spawns.push(npc);
        }

        r.enter(MapSection::Unknowns);
        let count = r.short()?;
        let mut unknowns = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = r.short()? as usize;
            unknowns.push(r.bytes(len)?.to_vec());
        }

        r.enter(MapSection::Chests);
        let count = r.short()?;
        let mut chests = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = r.position();
            let chest = ChestSpawnMapEntity {
                x: r.char()?,
                y: r.char()?,
                key: r.short()?,
                slot: r.char()?,
                item_id: r.short()?,
                respawn_time: r.short()?,
                amount: r.three()?,
            };
            r.check_position(start, bounds, chest.position())?;
            chests.push(chest);
        }

        r.enter(MapSection::Signs);
        let count = r.short()?;
        let mut signs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = r.position();
            let x = r.char()?;
            let y = r.char()?;
            let title = r.break_string()?;
            let message = r.break_string()?;
            let sign = SignMapEntity { x, y, title, message };
            r.check_position(start, bounds, sign.position())?;
            signs.push(sign);
        }

        let trailing_bytes = r.end_bytes().to_vec();

        Ok(MapFile::from_parts(
            properties,
            tiles,
            gfx,
            warps,
            npc_spawns,
            unknowns,
            chests,
            signs,
            trailing_bytes,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    width: u8,
    height: u8,
}

impl Bounds {
    fn rows(self) -> usize {
        self.height as usize + 1
    }

    fn cols(self) -> usize {
        self.width as usize + 1
    }
}

/// [`EoReader`] that tags failures with the section being decoded
struct SectionReader<'a> {
    reader: EoReader<'a>,
    section: MapSection,
}

impl<'a> SectionReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            reader: EoReader::new(data),
            section: MapSection::Header,
        }
    }

    fn enter(&mut self, section: MapSection) {
        self.section = section;
    }

    fn position(&self) -> usize {
        self.reader.position()
    }

    fn error_at(&self, offset: usize, kind: FormatErrorKind) -> MapError {
        MapError::Format(MapFormatError {
            section: self.section,
            offset,
            kind,
        })
    }

    fn encoding(&self, err: EncodingError) -> MapError {
        let offset = err.offset().unwrap_or_else(|| self.position());
        self.error_at(offset, FormatErrorKind::Encoding(err))
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.reader.get_bytes(len).map_err(|e| self.encoding(e))
    }

    fn char(&mut self) -> Result<u8> {
        self.reader.get_char().map_err(|e| self.encoding(e))
    }

    fn short(&mut self) -> Result<u16> {
        self.reader.get_short().map_err(|e| self.encoding(e))
    }

    fn three(&mut self) -> Result<u32> {
        self.reader.get_three().map_err(|e| self.encoding(e))
    }

    fn int(&mut self) -> Result<u32> {
        self.reader.get_int().map_err(|e| self.encoding(e))
    }

    fn flag(&mut self) -> Result<bool> {
        let start = self.position();
        match self.char()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.error_at(start, FormatErrorKind::InvalidFlag(other))),
        }
    }

    fn map_string(&mut self, len: usize) -> Result<String> {
        self.reader.get_map_string(len).map_err(|e| self.encoding(e))
    }

    /// Break string that must be terminated inside the buffer
    fn break_string(&mut self) -> Result<String> {
        if !self.reader.peek_remaining().contains(&BREAK_BYTE) {
            let end = self.position() + self.reader.remaining();
            return Err(self.error_at(end, FormatErrorKind::UnterminatedString));
        }
        self.reader.get_break_string().map_err(|e| self.encoding(e))
    }

    fn end_bytes(&mut self) -> &'a [u8] {
        self.reader.get_end_bytes()
    }

    fn check_position(&self, start: usize, bounds: Bounds, at: MapCoordinate) -> Result<()> {
        if at.is_within(bounds.width, bounds.height) {
            return Ok(());
        }
        Err(self.error_at(
            start,
            FormatErrorKind::OutOfRange {
                x: at.x,
                y: at.y,
                width: bounds.width,
                height: bounds.height,
            },
        ))
    }
}

/// Decode one run-length encoded layer
fn read_layer<'a, T, F>(r: &mut SectionReader<'a>, bounds: Bounds, default: T, mut read_value: F) -> Result<Matrix<T>>
where
    T: Clone,
    F: FnMut(&mut SectionReader<'a>) -> Result<T>,
{
    let rows = bounds.rows();
    let cols = bounds.cols();
    let mut layer = Matrix::new(rows, cols, default);

    for (y, row) in layer.rows_mut().enumerate() {
        let mut previous: Option<u8> = None;
        loop {
            let start = r.position();
            match r.reader.peek_byte() {
                None => return Err(r.error_at(start, FormatErrorKind::UnterminatedRow)),
                Some(BREAK_BYTE) => {
                    r.bytes(1)?;
                    break;
                }
                Some(_) => {}
            }

            let x = r.char()?;
            let value = read_value(r)?;

            if x as usize >= cols {
                return Err(r.error_at(
                    start,
                    FormatErrorKind::OutOfRange {
                        x,
                        // rows never exceed 256, the cast is exact
                        y: y as u8,
                        width: bounds.width,
                        height: bounds.height,
                    },
                ));
            }
            if let Some(previous) = previous.filter(|&p| x <= p) {
                return Err(r.error_at(start, FormatErrorKind::UnorderedRun { x, previous }));
            }

            // Later runs in the row overwrite the tail again
            row[x as usize..].fill(value);
            previous = Some(x);
        }
    }

    Ok(layer)
}

/// Encode one layer as canonical runs
fn write_layer<T, F>(w: &mut EoWriter, layer: &Matrix<T>, default: T, mut write_value: F) -> Result<()>
where
    T: Clone + PartialEq,
    F: FnMut(&mut EoWriter, &T) -> std::result::Result<(), EncodingError>,
{
    for row in layer.iter_rows() {
        let mut current = &default;
        for (x, value) in row.iter().enumerate() {
            if value != current {
                let x = u8::try_from(x).map_err(|_| EncodingError::OutOfRange {
                    value: x as u64,
                    width: 1,
                    max: eoclient_protocol::CHAR_MAX as u64,
                })?;
                w.add_char(x)?;
                write_value(w, value)?;
                current = value;
            }
        }
        w.add_byte(BREAK_BYTE);
    }
    Ok(())
}

fn estimate_size(map: &MapFile) -> usize {
    let rows = map.properties().rows();
    64 + rows * 10 + map.warps().len() * 9 + map.npc_spawns().len() * 8 + map.chests().len() * 12
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_map() -> MapFile {
        MapFile::new(
            MapFileProperties::new()
                .with_map_id(MapId::new(7))
                .with_name("Tiny")
                .with_size(1, 1),
        )
    }

    fn format_error(data: &[u8]) -> MapFormatError {
        match MapFileSerializer::deserialize(data) {
            Err(MapError::Format(err)) => err,
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_warp_scenario_roundtrip() {
        let map = tiny_map()
            .with_warp(WarpMapEntity::new(0, 0, 5, 3, 3))
            .unwrap();

        let bytes = MapFileSerializer::serialize(&map).unwrap();
        let decoded = MapFileSerializer::deserialize(&bytes).unwrap();

        assert_eq!(decoded.properties().width(), 1);
        assert_eq!(decoded.properties().height(), 1);
        assert_eq!(decoded.warps().len(), 1);
        let warp = decoded.warp_at(0, 0).unwrap();
        assert_eq!(warp.destination_map, 5);
        assert_eq!((warp.destination_x, warp.destination_y), (3, 3));
        assert_eq!(decoded, map);
        assert_eq!(MapFileSerializer::serialize(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_header_layout() {
        let bytes = MapFileSerializer::serialize(&tiny_map()).unwrap();
        assert_eq!(&bytes[..3], b"EMF");
        // checksum 0
        assert_eq!(&bytes[3..7], &[1, 1, 1, 1]);
        // map id 7
        assert_eq!(&bytes[7..9], &[1, 8]);
    }

    #[test]
    fn test_equal_neighbours_share_one_run() {
        let map = MapFile::new(MapFileProperties::new().with_size(4, 0));
        let map = (0..5).fold(map, |map, x| map.with_tile(x, 0, TileSpec::Water).unwrap());

        let bytes = MapFileSerializer::serialize(&map).unwrap();
        let plain = MapFileSerializer::serialize(&MapFile::new(map.properties().clone())).unwrap();

        // One (x, spec) run of two bytes
        assert_eq!(bytes.len(), plain.len() + 2);
        let decoded = MapFileSerializer::deserialize(&bytes).unwrap();
        assert!((0..5).all(|x| decoded.tile_at(x, 0) == Some(TileSpec::Water)));
    }

    #[test]
    fn test_return_to_default_is_explicit() {
        let map = MapFile::new(MapFileProperties::new().with_size(3, 0))
            .with_gfx(MapLayer::Ground, 1, 0, 12)
            .unwrap();
        let decoded = MapFileSerializer::deserialize(&MapFileSerializer::serialize(&map).unwrap()).unwrap();
        let row: Vec<u16> = decoded.gfx(MapLayer::Ground).row(0).unwrap().to_vec();
        assert_eq!(row, vec![0, 12, 0, 0]);
    }

    #[test]
    fn test_full_roundtrip_preserves_opaque_data() {
        let map = tiny_map()
            .with_tile(1, 1, TileSpec::Chest)
            .unwrap()
            .with_gfx(MapLayer::Shadow, 0, 1, 300)
            .unwrap()
            .with_npc_spawn(NpcSpawnMapEntity::new(1, 0, 42).with_respawn_time(30))
            .unwrap()
            .with_chest(ChestSpawnMapEntity::new(1, 1, 1, 70_000).with_key(3))
            .unwrap()
            .with_sign(SignMapEntity::new(0, 1, "Welcome", "to Aeven"))
            .unwrap()
            .with_unknowns(vec![vec![1, 2, 3], vec![]])
            .with_trailing_bytes(vec![0, 0xFF, 9]);

        let bytes = map.to_bytes().unwrap();
        let decoded = MapFile::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
        assert_eq!(decoded.trailing_bytes(), &[0, 0xFF, 9]);
        assert_eq!(decoded.sign_at(0, 1).map(|s| s.message.as_str()), Some("to Aeven"));
    }

    #[test]
    fn test_other_holding_named_codes_roundtrip() {
        let map = MapFile::new(
            MapFileProperties::new()
                .with_size(2, 1)
                .with_map_type(MapType::Other(0))
                .with_effect(MapEffect::Other(1)),
        )
        .with_tile(1, 0, TileSpec::Other(9))
        .unwrap()
        .with_tile(2, 0, TileSpec::Chest)
        .unwrap()
        .with_warp(WarpMapEntity::new(0, 1, 2, 0, 0).with_door(DoorSpec::Other(1)))
        .unwrap();

        let bytes = map.to_bytes().unwrap();
        let decoded = MapFile::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(decoded.properties().map_type(), MapType::Normal);
        assert_eq!(decoded.tile_at(1, 0), Some(TileSpec::Chest));
        assert!(!decoded.tile_at(1, 0).unwrap().is_walkable());
        // Other(9) and Chest share one run
        let named = map.clone().with_tile(1, 0, TileSpec::Chest).unwrap();
        assert_eq!(bytes, named.to_bytes().unwrap());
    }

    /// xorshift64, enough to spread values over a layer
    struct Seeded(u64);

    impl Seeded {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound
        }
    }

    fn random_map(rng: &mut Seeded) -> MapFile {
        let (width, height) = (rng.below(12) as u8, rng.below(12) as u8);
        let mut map = MapFile::new(
            MapFileProperties::new()
                .with_map_id(MapId::new(rng.below(500) as u16))
                .with_size(width, height)
                .with_map_type(MapType::from_code(rng.below(5) as u8))
                .with_fill_tile(rng.below(100) as u16),
        );

        // Few distinct values, so both long runs and single cells show up
        let tile_palette = [TileSpec::None, TileSpec::Wall, TileSpec::Water, TileSpec::Other(rng.below(254) as u8)];
        let gfx_palette = [EMPTY_GFX, 1, 2, rng.below(64_516) as u16];

        for y in 0..=height {
            for x in 0..=width {
                let tile = tile_palette[rng.below(4) as usize];
                map = map.with_tile(x, y, tile).unwrap();
                let layer = MapLayer::ALL[rng.below(9) as usize];
                map = map.with_gfx(layer, x, y, gfx_palette[rng.below(4) as usize]).unwrap();
                match rng.below(16) {
                    0 => {
                        let warp = WarpMapEntity::new(x, y, rng.below(300) as u16, 1, 1)
                            .with_door(DoorSpec::from_code(rng.below(6) as u16));
                        map = map.with_warp(warp).unwrap();
                    }
                    1 => map = map.with_npc_spawn(NpcSpawnMapEntity::new(x, y, rng.below(400) as u16)).unwrap(),
                    2 => map = map.with_chest(ChestSpawnMapEntity::new(x, y, 1, rng.below(1000) as u32)).unwrap(),
                    3 => map = map.with_sign(SignMapEntity::new(x, y, "Sign", format!("{}", rng.next()))).unwrap(),
                    _ => {}
                }
            }
        }

        let unknowns = (0..rng.below(3)).map(|n| vec![n as u8; rng.below(5) as usize]).collect();
        map.with_unknowns(unknowns)
    }

    #[test]
    fn test_random_maps_roundtrip() {
        let mut rng = Seeded(0x2545_f491_4f6c_dd1d);
        for _ in 0..64 {
            let map = random_map(&mut rng);
            let bytes = map.to_bytes().unwrap();
            let decoded = MapFile::from_bytes(&bytes).unwrap();
            assert_eq!(decoded, map);
            assert_eq!(decoded.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = tiny_map().to_bytes().unwrap();
        bytes[0] = b'X';
        let err = format_error(&bytes);
        assert_eq!(err.section, MapSection::Header);
        assert_eq!(err.offset, 0);
        assert_eq!(err.kind, FormatErrorKind::BadMagic(*b"XMF"));
    }

    #[test]
    fn test_every_truncation_fails() {
        let map = tiny_map()
            .with_warp(WarpMapEntity::new(1, 1, 2, 0, 0))
            .unwrap()
            .with_sign(SignMapEntity::new(0, 0, "t", "m"))
            .unwrap();
        let bytes = map.to_bytes().unwrap();
        for len in 0..bytes.len() {
            assert!(
                MapFileSerializer::deserialize(&bytes[..len]).is_err(),
                "prefix of {} bytes decoded",
                len
            );
        }
    }

    #[test]
    fn test_truncated_properties_reports_section() {
        let bytes = tiny_map().to_bytes().unwrap();
        let err = format_error(&bytes[..20]);
        assert_eq!(err.section, MapSection::Properties);
        assert!(matches!(err.kind, FormatErrorKind::Encoding(EncodingError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_run_outside_row_is_rejected() {
        // Width 1 allows x in 0..=1, so a run at x=2 is invalid
        let bytes = tiny_map().to_bytes().unwrap();
        let tiles_start = 3 + 4 + 40;
        let mut data = bytes[..tiles_start].to_vec();
        data.extend_from_slice(&[3, 1, BREAK_BYTE]);
        data.extend_from_slice(&bytes[tiles_start + 1..]);

        let err = format_error(&data);
        assert_eq!(err.section, MapSection::Tiles);
        assert_eq!(err.offset, tiles_start);
        assert!(matches!(err.kind, FormatErrorKind::OutOfRange { x: 2, y: 0, .. }));
    }

    #[test]
    fn test_unordered_runs_are_rejected() {
        let bytes = tiny_map().to_bytes().unwrap();
        let tiles_start = 3 + 4 + 40;
        let mut data = bytes[..tiles_start].to_vec();
        data.extend_from_slice(&[2, 1, 2, 2, BREAK_BYTE]);
        data.extend_from_slice(&bytes[tiles_start + 1..]);

        let err = format_error(&data);
        assert_eq!(err.offset, tiles_start + 2);
        assert_eq!(err.kind, FormatErrorKind::UnorderedRun { x: 1, previous: 1 });
    }

    #[test]
    fn test_duplicate_warp_is_rejected() {
        let map = tiny_map().with_warp(WarpMapEntity::new(1, 0, 2, 0, 0)).unwrap();
        let bytes = map.to_bytes().unwrap();

        // Locate the warp record by its encoded count and duplicate it
        let record = [2, 1, 1, 3, 1, 1, 1, 1, 1];
        let at = bytes.windows(record.len()).position(|w| w == record).unwrap();
        let mut data = bytes[..at - 2].to_vec();
        data.extend_from_slice(&[1, 3]);
        data.extend_from_slice(&record);
        data.extend_from_slice(&bytes[at..]);

        let err = format_error(&data);
        assert_eq!(err.section, MapSection::Warps);
        assert_eq!(err.kind, FormatErrorKind::DuplicateWarp { x: 1, y: 0 });
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let mut bytes = tiny_map().to_bytes().unwrap();
        // map_available follows 3 + 4 + 2 + 24 + 4 + 2 + 2 + 2 bytes
        let flag_at = 3 + 4 + 2 + 24 + 4 + 2 + 2 + 2;
        bytes[flag_at] = 3;
        let err = format_error(&bytes);
        assert_eq!(err.section, MapSection::Properties);
        assert_eq!(err.offset, flag_at);
        assert_eq!(err.kind, FormatErrorKind::InvalidFlag(2));
    }

    #[test]
    fn test_oversized_value_fails_to_encode() {
        let map = tiny_map()
            .with_chest(ChestSpawnMapEntity::new(0, 0, 1, eoclient_protocol::THREE_MAX + 1))
            .unwrap();
        assert!(matches!(
            MapFileSerializer::serialize(&map),
            Err(MapError::Encoding(EncodingError::OutOfRange { .. }))
        ));
    }
}

//! Map entity types
//!
//! Everything placed on a map (warps, NPC spawns, chests, signs) plus the
//! small enumerations stored in tiles and properties. All of these are plain
//! values; the owning [`MapFile`](crate::MapFile) decides where they live.

use eoclient_core::MapCoordinate;
use serde::{Deserialize, Serialize};

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        ///
        /// Values compare by code, so `Other` holding a named code equals the
        /// named variant.
        #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// Code with no named meaning
            Other($repr),
        }

        impl $name {
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $( $value => Self::$variant, )*
                    other => Self::Other(other),
                }
            }

            pub fn code(self) -> $repr {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Other(code) => code,
                }
            }

            /// Same value with named codes taken out of `Other`
            pub fn canonical(self) -> Self {
                Self::from_code(self.code())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.code() == other.code()
            }
        }

        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.code().hash(state);
            }
        }
    };
}

code_enum! {
    /// Special behaviour of a tile
    pub enum TileSpec: u8 {
        Wall = 0,
        ChairDown = 1,
        ChairLeft = 2,
        ChairRight = 3,
        ChairUp = 4,
        ChairDownRight = 5,
        ChairUpLeft = 6,
        ChairAll = 7,
        JammedDoor = 8,
        Chest = 9,
        BankVault = 16,
        NpcBoundary = 17,
        MapEdge = 18,
        FakeWall = 19,
        Board1 = 20,
        Board2 = 21,
        Board3 = 22,
        Board4 = 23,
        Board5 = 24,
        Board6 = 25,
        Board7 = 26,
        Board8 = 27,
        Jukebox = 28,
        Jump = 29,
        Water = 30,
        Arena = 32,
        AmbientSource = 33,
        SpikesStatic = 34,
        SpikesTrap = 35,
        SpikesTimed = 36,
        /// Plain walkable tile, the default for cells without a run
        None = 253,
    }
}

impl TileSpec {
    /// Whether a player can stand on this tile
    pub fn is_walkable(self) -> bool {
        !matches!(
            self.canonical(),
            Self::Wall
                | Self::JammedDoor
                | Self::Chest
                | Self::BankVault
                | Self::MapEdge
                | Self::Board1
                | Self::Board2
                | Self::Board3
                | Self::Board4
                | Self::Board5
                | Self::Board6
                | Self::Board7
                | Self::Board8
                | Self::Jukebox
        )
    }
}

impl Default for TileSpec {
    fn default() -> Self {
        Self::None
    }
}

code_enum! {
    /// Combat rules of a map
    pub enum MapType: u8 {
        Normal = 0,
        Pk = 3,
    }
}

impl Default for MapType {
    fn default() -> Self {
        Self::Normal
    }
}

code_enum! {
    /// Timed environmental effect
    pub enum MapEffect: u8 {
        None = 0,
        HpDrain = 1,
        TpDrain = 2,
        Quake1 = 3,
        Quake2 = 4,
        Quake3 = 5,
        Quake4 = 6,
    }
}

impl Default for MapEffect {
    fn default() -> Self {
        Self::None
    }
}

code_enum! {
    /// Door attached to a warp
    pub enum DoorSpec: u16 {
        NoDoor = 0,
        Door = 1,
        LockedSilver = 2,
        LockedCrystal = 3,
        LockedWraith = 4,
    }
}

impl Default for DoorSpec {
    fn default() -> Self {
        Self::NoDoor
    }
}

/// Graphic layers, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MapLayer {
    Ground,
    Objects,
    Overlay,
    DownWall,
    RightWall,
    Roof,
    Top,
    Shadow,
    Overlay2,
}

impl MapLayer {
    /// All layers in the order they are stored
    pub const ALL: [MapLayer; 9] = [
        MapLayer::Ground,
        MapLayer::Objects,
        MapLayer::Overlay,
        MapLayer::DownWall,
        MapLayer::RightWall,
        MapLayer::Roof,
        MapLayer::Top,
        MapLayer::Shadow,
        MapLayer::Overlay2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Objects => "objects",
            Self::Overlay => "overlay",
            Self::DownWall => "down wall",
            Self::RightWall => "right wall",
            Self::Roof => "roof",
            Self::Top => "top",
            Self::Shadow => "shadow",
            Self::Overlay2 => "overlay 2",
        }
    }
}

/// Tile that moves the player to another location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarpMapEntity {
    pub x: u8,
    pub y: u8,
    pub destination_map: u16,
    pub destination_x: u8,
    pub destination_y: u8,
    /// Minimum level required to use the warp
    pub level_required: u8,
    pub door: DoorSpec,
}

impl WarpMapEntity {
    pub fn new(x: u8, y: u8, destination_map: u16, destination_x: u8, destination_y: u8) -> Self {
        Self {
            x,
            y,
            destination_map,
            destination_x,
            destination_y,
            level_required: 0,
            door: DoorSpec::NoDoor,
        }
    }

    pub fn position(&self) -> MapCoordinate {
        MapCoordinate::new(self.x, self.y)
    }

    pub fn with_level_required(mut self, level: u8) -> Self {
        self.level_required = level;
        self
    }

    pub fn with_door(mut self, door: DoorSpec) -> Self {
        self.door = door;
        self
    }
}

/// NPC spawn point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NpcSpawnMapEntity {
    pub x: u8,
    pub y: u8,
    pub id: u16,
    pub spawn_type: u8,
    /// Seconds between respawns
    pub respawn_time: u16,
    pub amount: u8,
}

impl NpcSpawnMapEntity {
    pub fn new(x: u8, y: u8, id: u16) -> Self {
        Self {
            x,
            y,
            id,
            spawn_type: 0,
            respawn_time: 0,
            amount: 1,
        }
    }

    pub fn position(&self) -> MapCoordinate {
        MapCoordinate::new(self.x, self.y)
    }

    pub fn with_spawn_type(mut self, spawn_type: u8) -> Self {
        self.spawn_type = spawn_type;
        self
    }

    pub fn with_respawn_time(mut self, seconds: u16) -> Self {
        self.respawn_time = seconds;
        self
    }

    pub fn with_amount(mut self, amount: u8) -> Self {
        self.amount = amount;
        self
    }
}

/// Item spawn inside a chest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChestSpawnMapEntity {
    pub x: u8,
    pub y: u8,
    /// Key item needed to open the chest (0 for none)
    pub key: u16,
    pub slot: u8,
    pub item_id: u16,
    /// Minutes between respawns
    pub respawn_time: u16,
    pub amount: u32,
}

impl ChestSpawnMapEntity {
    pub fn new(x: u8, y: u8, item_id: u16, amount: u32) -> Self {
        Self {
            x,
            y,
            key: 0,
            slot: 0,
            item_id,
            respawn_time: 0,
            amount,
        }
    }

    pub fn position(&self) -> MapCoordinate {
        MapCoordinate::new(self.x, self.y)
    }

    pub fn with_key(mut self, key: u16) -> Self {
        self.key = key;
        self
    }

    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_respawn_time(mut self, minutes: u16) -> Self {
        self.respawn_time = minutes;
        self
    }
}

/// Readable sign
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignMapEntity {
    pub x: u8,
    pub y: u8,
    pub title: String,
    pub message: String,
}

impl SignMapEntity {
    pub fn new(x: u8, y: u8, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            x,
            y,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn position(&self) -> MapCoordinate {
        MapCoordinate::new(self.x, self.y)
    }
}

//! # EO Packet Identifiers
//!
//! Every packet is identified by a `(family, action)` pair. The family names
//! the category of message (login, walking, items, ...), the action names the
//! verb (request, reply, add, remove, ...).
//!
//! Both identifiers are single raw bytes on the wire. Values this client does
//! not know about are preserved as `Other(u8)` so a newer server can add
//! messages without breaking older clients.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        ///
        /// Identifiers compare by their raw byte, so `Other` holding a known
        /// byte equals the named variant.
        #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// Identifier not known to this client
            Other(u8),
        }

        impl $name {
            /// Convert a raw byte to an identifier
            pub const fn from_u8(value: u8) -> Self {
                match value {
                    $( $value => Self::$variant, )*
                    other => Self::Other(other),
                }
            }

            /// Raw byte for this identifier
            pub const fn as_u8(self) -> u8 {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Other(value) => value,
                }
            }

            /// Same identifier with known bytes taken out of `Other`
            pub const fn canonical(self) -> Self {
                Self::from_u8(self.as_u8())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.as_u8() == other.as_u8()
            }
        }

        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.as_u8().hash(state);
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                Self::from_u8(value)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.as_u8()
            }
        }
    };
}

wire_enum! {
    /// Packet family (message category)
    pub enum PacketFamily {
        Connection = 1,
        Account = 2,
        Character = 3,
        Login = 4,
        Welcome = 5,
        Walk = 6,
        Face = 7,
        Chair = 8,
        Emote = 9,
        Attack = 11,
        Spell = 12,
        Shop = 13,
        Item = 14,
        StatSkill = 16,
        Global = 17,
        Talk = 18,
        Warp = 19,
        Jukebox = 21,
        Players = 22,
        Avatar = 23,
        Party = 24,
        Refresh = 25,
        Npc = 26,
        PlayerRange = 27,
        NpcRange = 28,
        /// NPCs and players entering view
        Appear = 29,
        Paperdoll = 30,
        Effect = 31,
        Trade = 32,
        Chest = 33,
        Door = 34,
        Message = 35,
        Bank = 36,
        Locker = 37,
        Barber = 38,
        Guild = 39,
        Music = 40,
        Sit = 41,
        Recover = 42,
        Board = 43,
        Cast = 44,
        Arena = 45,
        Priest = 46,
        Marriage = 47,
        AdminInteract = 48,
        Citizen = 49,
        Quest = 50,
        Book = 51,
        Error = 250,
        Init = 255,
    }
}

wire_enum! {
    /// Packet action (message verb)
    pub enum PacketAction {
        Request = 1,
        Accept = 2,
        Reply = 3,
        Remove = 4,
        Agree = 5,
        Create = 6,
        Add = 7,
        Player = 8,
        Take = 9,
        Use = 10,
        Buy = 11,
        Sell = 12,
        Open = 13,
        Close = 14,
        Message = 15,
        Spec = 16,
        Admin = 17,
        List = 18,
        Tell = 20,
        Report = 21,
        Announce = 22,
        Server = 23,
        Drop = 24,
        Junk = 25,
        Obtain = 26,
        Get = 27,
        Kick = 28,
        Rank = 29,
        TargetSelf = 30,
        TargetOther = 31,
        TargetGroup = 33,
        Dialog = 34,
        Ping = 240,
        Pong = 241,
        Net3 = 242,
        Init = 255,
    }
}

/// Routing key for a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketKey {
    pub family: PacketFamily,
    pub action: PacketAction,
}

impl PacketKey {
    #[inline]
    pub const fn new(family: PacketFamily, action: PacketAction) -> Self {
        Self {
            family: family.canonical(),
            action: action.canonical(),
        }
    }
}

impl fmt::Display for PacketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}_{:?}", self.family.canonical(), self.action.canonical())
    }
}

impl From<(PacketFamily, PacketAction)> for PacketKey {
    fn from((family, action): (PacketFamily, PacketAction)) -> Self {
        Self::new(family, action)
    }
}

//! Packets the client handles
//!
//! Each route records whether its handler only makes sense once a character
//! is in the game world. Login, account and character selection replies
//! arrive before that point and are never gated.

use eoclient_protocol::{PacketAction as A, PacketFamily as F, PacketKey};

/// A handled `(family, action)` pair and its gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownRoute {
    pub key: PacketKey,
    pub in_game_only: bool,
}

const fn route(family: F, action: A, in_game_only: bool) -> KnownRoute {
    KnownRoute {
        key: PacketKey::new(family, action),
        in_game_only,
    }
}

/// Every route the client registers a handler for
pub const KNOWN_ROUTES: [KnownRoute; 34] = [
    route(F::Account, A::Reply, false),
    route(F::Appear, A::Reply, true),
    route(F::Avatar, A::Agree, true),
    route(F::Avatar, A::Remove, true),
    route(F::Character, A::Player, false),
    route(F::Character, A::Reply, false),
    // Ping
    route(F::Connection, A::Player, false),
    route(F::Door, A::Open, true),
    route(F::Face, A::Player, false),
    route(F::Init, A::Init, false),
    route(F::Item, A::Add, true),
    route(F::Item, A::Drop, true),
    route(F::Item, A::Get, true),
    route(F::Item, A::Junk, true),
    route(F::Item, A::Remove, true),
    route(F::Login, A::Reply, false),
    route(F::Npc, A::Player, true),
    route(F::Npc, A::Spec, true),
    route(F::Paperdoll, A::Agree, true),
    route(F::Paperdoll, A::Remove, true),
    route(F::Paperdoll, A::Reply, true),
    route(F::Players, A::Agree, true),
    route(F::Refresh, A::Reply, true),
    route(F::StatSkill, A::Player, true),
    route(F::Talk, A::Message, true),
    route(F::Talk, A::Player, true),
    route(F::Talk, A::Reply, true),
    route(F::Talk, A::Request, true),
    route(F::Talk, A::Tell, true),
    route(F::Walk, A::Reply, true),
    route(F::Walk, A::Player, true),
    route(F::Warp, A::Agree, true),
    route(F::Warp, A::Request, true),
    route(F::Welcome, A::Reply, false),
];

/// Look up a known route
pub fn known_route(key: PacketKey) -> Option<&'static KnownRoute> {
    KNOWN_ROUTES.iter().find(|route| route.key == key)
}

//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Map ID (16-bit unsigned, matches the two-byte wire width)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub u16);

impl MapId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl From<u16> for MapId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client game state
///
/// Only [`GameState::InGame`] satisfies handlers that are registered as
/// in-game only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// No connection to the server
    #[default]
    Initial,
    /// Connected and initialized, not logged in
    Connected,
    /// Account logged in, selecting a character
    LoggedIn,
    /// Character selected and in active play
    InGame,
}

impl GameState {
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InGame)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Connected => "connected",
            Self::LoggedIn => "logged-in",
            Self::InGame => "in-game",
        }
    }
}

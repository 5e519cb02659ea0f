//! Game state repository
//!
//! Handlers and the dispatcher share one repository, passed in explicitly
//! rather than reached through a global.

use eoclient_core::GameState;
use parking_lot::RwLock;

/// Current client game state
#[derive(Debug, Default)]
pub struct GameStateRepository {
    state: RwLock<GameState>,
}

impl GameStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        *self.state.read()
    }

    pub fn is_in_game(&self) -> bool {
        self.state.read().is_in_game()
    }

    /// Move to a new state, returning the previous one
    pub fn set_state(&self, state: GameState) -> GameState {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            tracing::debug!("Game state {} -> {}", previous.as_str(), state.as_str());
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let repo = GameStateRepository::new();
        assert_eq!(repo.state(), GameState::Initial);
        assert!(!repo.is_in_game());

        assert_eq!(repo.set_state(GameState::LoggedIn), GameState::Initial);
        assert_eq!(repo.set_state(GameState::InGame), GameState::LoggedIn);
        assert!(repo.is_in_game());
    }
}

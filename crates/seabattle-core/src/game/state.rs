//! Match state threaded through every attack.

use crate::protocol::{AttackRecord, Player};
use serde::{Deserialize, Serialize};

/// Lifecycle of a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for both defenders
    Setup,
    InProgress,
    /// Terminal; nothing changes after this
    Concluded,
}

/// Turn ownership, counters and the append-only history.
///
/// Only [`resolve_attack`](super::resolve_attack) mutates a `GameState`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    current_turn: Player,
    total_turns: u32,
    concluded: bool,
    winner: Option<Player>,
    history: Vec<AttackRecord>,
}

impl GameState {
    pub const FIRST_TURN: Player = Player::Alice;

    pub fn new() -> Self {
        Self {
            current_turn: Self::FIRST_TURN,
            total_turns: 0,
            concluded: false,
            winner: None,
            history: Vec::new(),
        }
    }

    pub fn current_turn(&self) -> Player {
        self.current_turn
    }

    /// Number of resolved, non-duplicate attacks that did not end the match
    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    pub fn is_concluded(&self) -> bool {
        self.concluded
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn history(&self) -> &[AttackRecord] {
        &self.history
    }

    pub(super) fn record(&mut self, record: AttackRecord) {
        self.history.push(record);
    }

    /// Hand the turn to the other player
    pub(super) fn advance(&mut self) {
        self.current_turn = self.current_turn.opponent();
        self.total_turns += 1;
    }

    pub(super) fn conclude(&mut self, winner: Player) {
        self.concluded = true;
        self.winner = Some(winner);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

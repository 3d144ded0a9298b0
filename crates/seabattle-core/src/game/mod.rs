//! Turn state machine and the defender seam it drives.

mod audit;
mod machine;
mod state;

pub use audit::{audit_reveal, verify_reveal};
pub use machine::resolve_attack;
pub use state::{GameState, Phase};

use crate::board::{Coordinate, StrikeEffect};
use crate::crypto::{BlindedQuery, BoardCommitment, EncryptedBoard};
use crate::error::DefenderError;
use crate::protocol::{FleetSummary, Player};

/// One player's side of the table, as the arbiter sees it.
///
/// Everything that needs the plaintext board or the private key happens
/// behind this trait. The arbiter only ever sees the encrypted snapshot,
/// the published commitment, single hit bits and damage counters. Opening a
/// board for the audit is not part of it: reveals go from one player to the
/// other, never through the arbiter.
pub trait Defender {
    /// Encrypted cells, sealed once at setup
    fn snapshot(&self) -> &EncryptedBoard;

    /// Commitment to the layout, published when seated
    fn commitment(&self) -> BoardCommitment;

    fn was_targeted(&self, coordinate: Coordinate) -> bool;

    /// Decrypt a blinded query and return the hit bit
    fn answer(&self, query: &BlindedQuery) -> Result<bool, DefenderError>;

    /// Apply a resolved strike to the plaintext bookkeeping
    fn record_strike(
        &mut self,
        coordinate: Coordinate,
        is_hit: bool,
    ) -> Result<StrikeEffect, DefenderError>;

    /// Per-ship damage, without positions
    fn fleet_summary(&self, player: Player) -> Result<FleetSummary, DefenderError>;
}

/// Both defenders of a live match
#[derive(Debug)]
pub struct Seats<D> {
    alice: D,
    bob: D,
}

impl<D> Seats<D> {
    pub fn new(alice: D, bob: D) -> Self {
        Self { alice, bob }
    }

    pub fn get(&self, player: Player) -> &D {
        match player {
            Player::Alice => &self.alice,
            Player::Bob => &self.bob,
        }
    }

    pub fn get_mut(&mut self, player: Player) -> &mut D {
        match player {
            Player::Alice => &mut self.alice,
            Player::Bob => &mut self.bob,
        }
    }
}

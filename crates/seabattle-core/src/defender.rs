//! In-process defender holding a player's secrets.

use crate::board::{Board, Coordinate, StrikeEffect};
use crate::crypto::{
    resolve_query, BlindedQuery, BoardCommitment, EncryptedBoard, KeyPair, PrivateKey, Salt,
};
use crate::error::DefenderError;
use crate::game::Defender;
use crate::protocol::{BoardReveal, FleetSummary, Player, ShipSummary};
use rand::{CryptoRng, RngCore};

/// Owns one player's board, private key and commitment salt.
///
/// The arbiter reaches it only through [`Defender`], which hands out the
/// sealed snapshot, hit bits and damage counters. [`LocalDefender::reveal`]
/// is for the owning player to pass to the opponent after the match.
pub struct LocalDefender {
    board: Board,
    private_key: PrivateKey,
    snapshot: EncryptedBoard,
    salt: Salt,
    commitment: BoardCommitment,
}

impl LocalDefender {
    /// Seal `board` under `keys` and commit to its layout
    pub fn new<R: RngCore + CryptoRng + ?Sized>(board: Board, keys: KeyPair, rng: &mut R) -> Self {
        let snapshot = EncryptedBoard::seal(&board, &keys.public, rng);
        let salt = Salt::random(rng);
        let commitment = BoardCommitment::new(&board.layout_bytes(), &salt);
        Self {
            board,
            private_key: keys.private,
            snapshot,
            salt,
            commitment,
        }
    }

    /// Plaintext board, for the owning player's own display
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Open the board for the opponent's post-game audit
    pub fn reveal(&self) -> BoardReveal {
        BoardReveal {
            ships: self.board.layout(),
            salt: self.salt.clone(),
        }
    }
}

impl Defender for LocalDefender {
    fn snapshot(&self) -> &EncryptedBoard {
        &self.snapshot
    }

    fn commitment(&self) -> BoardCommitment {
        self.commitment
    }

    fn was_targeted(&self, coordinate: Coordinate) -> bool {
        self.board.was_targeted(coordinate)
    }

    fn answer(&self, query: &BlindedQuery) -> Result<bool, DefenderError> {
        resolve_query(&self.private_key, query)
    }

    fn record_strike(
        &mut self,
        coordinate: Coordinate,
        is_hit: bool,
    ) -> Result<StrikeEffect, DefenderError> {
        if self.board.has_ship(coordinate) != is_hit {
            return Err(DefenderError::InconsistentAnswer { coordinate });
        }
        Ok(self.board.record_strike(coordinate))
    }

    fn fleet_summary(&self, player: Player) -> Result<FleetSummary, DefenderError> {
        Ok(FleetSummary {
            player,
            all_sunk: self.board.all_sunk(),
            ships: self.board.ships().iter().map(ShipSummary::from).collect(),
        })
    }
}

impl std::fmt::Debug for LocalDefender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDefender")
            .field("snapshot", &self.snapshot)
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

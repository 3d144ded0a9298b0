//! The mediator between two defenders.
//!
//! The arbiter owns the [`GameState`] and the seated defenders, builds every
//! blinded query from public material and only ever learns hit bits. It never
//! holds a plaintext board or a private key, and never sees a reveal: the
//! post-game audit runs between the players against [`Arbiter::transcript`].

use crate::crypto::BoardCommitment;
use crate::error::GameError;
use crate::game::{resolve_attack, Defender, GameState, Phase, Seats};
use crate::protocol::{
    AttackEnvelope, AttackRecord, MatchId, MatchStarted, MatchTranscript, Player, StatusEnvelope,
};
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

enum Table<D> {
    Setup { alice: Option<D>, bob: Option<D> },
    Live(Seats<D>),
}

/// One match. Callers serialize access (one attack in flight at a time).
pub struct Arbiter<D, R = StdRng> {
    match_id: MatchId,
    state: GameState,
    table: Table<D>,
    commitments: BTreeMap<Player, BoardCommitment>,
    rng: R,
}

impl<D: Defender> Arbiter<D, StdRng> {
    /// Blinding scalars come from an OS-seeded `StdRng`
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<D: Defender> Default for Arbiter<D, StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Defender, R: RngCore + CryptoRng> Arbiter<D, R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            match_id: MatchId::new(),
            state: GameState::new(),
            table: Table::Setup {
                alice: None,
                bob: None,
            },
            commitments: BTreeMap::new(),
            rng,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn phase(&self) -> Phase {
        match self.table {
            Table::Setup { .. } => Phase::Setup,
            Table::Live(_) if self.state.is_concluded() => Phase::Concluded,
            Table::Live(_) => Phase::InProgress,
        }
    }

    /// Register `player`'s defender.
    ///
    /// The call that fills the second seat starts the match and returns the
    /// start notice.
    pub fn seat(&mut self, player: Player, defender: D) -> Result<Option<MatchStarted>, GameError> {
        let Table::Setup { alice, bob } = &mut self.table else {
            return Err(GameError::SeatTaken(player));
        };
        let slot = match player {
            Player::Alice => alice,
            Player::Bob => bob,
        };
        if slot.is_some() {
            return Err(GameError::SeatTaken(player));
        }

        let commitment = defender.commitment();
        info!("Match {}: {} seated, commitment {}", self.match_id, player, commitment);
        self.commitments.insert(player, commitment);
        *slot = Some(defender);

        Ok(self.try_start())
    }

    fn try_start(&mut self) -> Option<MatchStarted> {
        let Table::Setup { alice, bob } = &mut self.table else {
            return None;
        };
        if alice.is_none() || bob.is_none() {
            return None;
        }
        let (Some(alice), Some(bob)) = (alice.take(), bob.take()) else {
            return None;
        };
        self.table = Table::Live(Seats::new(alice, bob));

        let first_turn = self.state.current_turn();
        info!("Match {} in progress, {} moves first", self.match_id, first_turn);
        Some(MatchStarted::new(self.match_id, first_turn))
    }

    /// Resolve an attack.
    ///
    /// Out-of-bounds and out-of-turn attacks come back as error envelopes with
    /// the match untouched. Attacks before the match starts, after it ended,
    /// or that break a defender are returned as `Err`.
    pub fn submit_attack(
        &mut self,
        attacker: Player,
        x: i32,
        y: i32,
    ) -> Result<AttackEnvelope, GameError> {
        let Table::Live(seats) = &mut self.table else {
            warn!("Match {}: attack by {} before start", self.match_id, attacker);
            return Err(GameError::MatchNotStarted);
        };

        match resolve_attack(&mut self.state, seats, attacker, x, y, &mut self.rng) {
            Ok(record) => {
                debug!(
                    "Match {}: turn {} {} -> {} {}",
                    self.match_id, record.turn, attacker, record.coordinate, record.outcome
                );
                if let Some(ship) = record.ship_sunk {
                    info!(
                        "Match {}: {} sank {}'s {}",
                        self.match_id,
                        attacker,
                        record.defender(),
                        ship
                    );
                }
                if let Some(winner) = self.state.winner() {
                    info!(
                        "Match {} concluded after {} turns, winner {}",
                        self.match_id,
                        self.state.total_turns(),
                        winner
                    );
                }
                Ok(AttackEnvelope::resolved(
                    &record,
                    self.state.is_concluded(),
                    self.state.winner(),
                ))
            }
            Err(e) if e.is_recoverable() => {
                warn!("Match {}: rejected attack by {}: {}", self.match_id, attacker, e);
                Ok(AttackEnvelope::rejected(attacker, x, y, e.to_string()))
            }
            Err(e) => {
                warn!("Match {}: attack by {} failed: {}", self.match_id, attacker, e);
                Err(e)
            }
        }
    }

    pub fn query_status(&self) -> Result<StatusEnvelope, GameError> {
        let Table::Live(seats) = &self.table else {
            return Err(GameError::MatchNotStarted);
        };
        let players = Player::ALL
            .iter()
            .map(|p| seats.get(*p).fleet_summary(*p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatusEnvelope {
            current_turn: self.state.current_turn(),
            total_turns: self.state.total_turns(),
            game_over: self.state.is_concluded(),
            winner: self.state.winner(),
            players,
        })
    }

    pub fn history(&self) -> &[AttackRecord] {
        self.state.history()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn winner(&self) -> Option<Player> {
        self.state.winner()
    }

    pub fn is_over(&self) -> bool {
        self.state.is_concluded()
    }

    pub fn current_turn(&self) -> Player {
        self.state.current_turn()
    }

    /// Commitment published when `player` was seated
    pub fn commitment(&self, player: Player) -> Option<BoardCommitment> {
        self.commitments.get(&player).copied()
    }

    /// Commitments and history, everything a player needs to audit the
    /// opponent's reveal
    pub fn transcript(&self) -> MatchTranscript {
        MatchTranscript {
            match_id: self.match_id,
            concluded: self.state.is_concluded(),
            winner: self.state.winner(),
            commitments: self.commitments.clone(),
            history: self.state.history().to_vec(),
        }
    }
}

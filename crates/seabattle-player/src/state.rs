//! Player service state. The private key and the plaintext board never leave
//! this process except as hit bits, damage counters and the post-game reveal.

use crate::client::RelayClient;
use seabattle_core::crypto::BlindedQuery;
use seabattle_core::protocol::SeatRequest;
use seabattle_core::{Defender, DefenderError, LocalDefender, MatchId, Player};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub struct PlayerState {
    player: Player,
    match_id: MatchId,
    defender: Arc<Mutex<LocalDefender>>,
    relay: RelayClient,
}

impl PlayerState {
    pub fn new(player: Player, match_id: MatchId, defender: LocalDefender, relay: RelayClient) -> Self {
        Self {
            player,
            match_id,
            defender: Arc::new(Mutex::new(defender)),
            relay,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Strikes from the relay are serialized here.
    pub fn defender(&self) -> MutexGuard<'_, LocalDefender> {
        self.defender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decrypt one blinded query. CPU bound, run off the async runtime.
    pub fn answer(&self, query: &BlindedQuery) -> Result<bool, DefenderError> {
        self.defender().answer(query)
    }

    /// The public half of this player's setup, sent to the relay to take a seat
    pub fn seat_request(&self, endpoint: impl Into<String>) -> SeatRequest {
        let defender = self.defender();
        SeatRequest {
            player: self.player,
            endpoint: endpoint.into(),
            snapshot: defender.snapshot().clone(),
            commitment: defender.commitment(),
        }
    }
}

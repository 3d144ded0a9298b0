//! Envelopes handed to callers of the arbiter, and the messages exchanged
//! between a relay and the player services that hold the secrets.
//!
//! The arbiter-side envelopes never carry cell values or key material.
//! Ciphertexts and public keys only travel from a player to the relay, and
//! a [`BoardReveal`] only travels from a player to its opponent.

use crate::board::{Coordinate, PlacedShip, ShipClass, BOARD_SIZE};
use crate::crypto::{BoardCommitment, EncryptedBoard, Salt};
use crate::protocol::{AttackRecord, MatchId, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Result of `submit_attack`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEnvelope {
    pub status: EnvelopeStatus,
    pub player: Player,
    pub coordinate: (i32, i32),
    pub is_hit: bool,
    pub is_duplicate: bool,
    pub ship_sunk: Option<String>,
    pub game_over: bool,
    pub winner: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AttackEnvelope {
    pub fn resolved(record: &AttackRecord, game_over: bool, winner: Option<Player>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            player: record.attacker,
            coordinate: (record.coordinate.x as i32, record.coordinate.y as i32),
            is_hit: record.is_hit(),
            is_duplicate: record.outcome == Outcome::Duplicate,
            ship_sunk: record.ship_sunk.map(|s| s.name().to_string()),
            game_over,
            winner,
            message: None,
        }
    }

    /// Envelope for a validation failure; the match is unchanged
    pub fn rejected(player: Player, x: i32, y: i32, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            player,
            coordinate: (x, y),
            is_hit: false,
            is_duplicate: false,
            ship_sunk: None,
            game_over: false,
            winner: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

/// Damage report for one ship, never its position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSummary {
    pub name: String,
    pub size: u8,
    pub hits: u8,
    pub sunk: bool,
}

impl From<&PlacedShip> for ShipSummary {
    fn from(ship: &PlacedShip) -> Self {
        Self {
            name: ship.class().name().to_string(),
            size: ship.class().length(),
            hits: ship.hits(),
            sunk: ship.is_sunk(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub player: Player,
    pub all_sunk: bool,
    pub ships: Vec<ShipSummary>,
}

/// Result of `query_status`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub current_turn: Player,
    pub total_turns: u32,
    pub game_over: bool,
    pub winner: Option<Player>,
    pub players: Vec<FleetSummary>,
}

/// Returned by the seating call that completes setup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStarted {
    pub match_id: MatchId,
    pub first_turn: Player,
    pub board_size: u8,
    pub ships_per_player: usize,
}

impl MatchStarted {
    pub fn new(match_id: MatchId, first_turn: Player) -> Self {
        Self {
            match_id,
            first_turn,
            board_size: BOARD_SIZE,
            ships_per_player: ShipClass::FLEET.len(),
        }
    }
}

/// A defender's opened board, handed to the opponent once the match is over
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoardReveal {
    pub ships: Vec<(ShipClass, Vec<Coordinate>)>,
    pub salt: Salt,
}

/// Everything the arbiter publishes about a match: the commitments taken at
/// seating and the resolved history. Enough to audit a reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTranscript {
    pub match_id: MatchId,
    pub concluded: bool,
    pub winner: Option<Player>,
    pub commitments: BTreeMap<Player, BoardCommitment>,
    pub history: Vec<AttackRecord>,
}

/// A transcript plus where each seated player's defender can be reached
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayTranscript {
    pub transcript: MatchTranscript,
    pub endpoints: BTreeMap<Player, String>,
}

// ============ Relay <-> player service ============

/// Public material a player sends to take a seat
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeatRequest {
    pub player: Player,
    /// Base URL of the player's defender service
    pub endpoint: String,
    pub snapshot: EncryptedBoard,
    pub commitment: BoardCommitment,
}

/// The defender's reply to a blinded query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitAnswer {
    pub hit: bool,
}

/// Asks a defender to book a resolved strike
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeRequest {
    pub coordinate: Coordinate,
    pub hit: bool,
}

/// Outcome of auditing one player's reveal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub player: Player,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

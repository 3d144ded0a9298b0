//! Seabattle Core Library
//!
//! Two-player Battleship where neither side ever sees the other's board.
//! Each player seals their grid cell by cell under their own Paillier key;
//! the arbiter turns every attack into a blinded query that decrypts to zero
//! exactly on a ship, so the defender releases one hit bit per shot and
//! nothing else.

pub mod arbiter;
pub mod board;
pub mod crypto;
pub mod defender;
pub mod error;
pub mod game;
pub mod protocol;

pub use arbiter::Arbiter;
pub use board::{Board, Coordinate, FleetBuilder, ShipClass, BOARD_SIZE};
pub use crypto::{BoardCommitment, KeyPair};
pub use defender::LocalDefender;
pub use error::{
    AuditError, BoardError, DefenderError, GameError, PlacementViolation, SnapshotError,
};
pub use game::{audit_reveal, Defender, GameState, Phase};
pub use protocol::{
    AttackEnvelope, AttackRecord, MatchId, MatchTranscript, Outcome, Player, StatusEnvelope,
};

//! Error types shared across the crate.

use crate::board::{Coordinate, Orientation, ShipClass};
use crate::protocol::Player;
use thiserror::Error;

/// Errors from building or mutating a board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Coordinate ({x}, {y}) out of bounds, use 0-9")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Could not place {ship} after {attempts} attempts")]
    PlacementExhausted { ship: ShipClass, attempts: usize },

    #[error("Invalid {ship}: {reason}")]
    InvalidShip { ship: ShipClass, reason: String },

    #[error("Ships overlap at {coordinate}")]
    Overlap { coordinate: Coordinate },

    #[error("{ship} placed more than once")]
    DuplicateShip { ship: ShipClass },

    #[error("Board has no ships")]
    EmptyFleet,

    #[error("Fleet incomplete: {placed} of {required} ships placed")]
    FleetIncomplete { placed: usize, required: usize },
}

/// Why a manual placement candidate was rejected.
///
/// Carries enough context to construct the next legal coordinate. Producing
/// a violation never changes the builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementViolation {
    #[error("Coordinates ({x}, {y}) out of bounds, use 0-9")]
    OutOfBounds { x: i32, y: i32 },

    #[error("{coordinate} is already part of this ship")]
    RepeatedCell { coordinate: Coordinate },

    #[error("{coordinate} is already occupied by the {ship}")]
    Occupied { coordinate: Coordinate, ship: ShipClass },

    #[error("{coordinate} leaves the {orientation} line of this ship{}", hint(.suggestion))]
    OffAxis {
        coordinate: Coordinate,
        orientation: Orientation,
        suggestion: Option<Coordinate>,
    },

    #[error("{coordinate} would leave a gap{}", hint(.suggestion))]
    NotContiguous {
        coordinate: Coordinate,
        orientation: Option<Orientation>,
        suggestion: Option<Coordinate>,
    },

    #[error("All ships are already placed")]
    FleetComplete,
}

fn hint(suggestion: &Option<Coordinate>) -> String {
    match suggestion {
        Some(c) => format!(", try {}", c),
        None => String::new(),
    }
}

/// Errors raised inside a defender's trust boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefenderError {
    #[error("Query was sealed under a different public key")]
    ForeignQuery,

    #[error("Protocol answer disagrees with the board at {coordinate}")]
    InconsistentAnswer { coordinate: Coordinate },

    #[error("Defender unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Errors from decoding an encrypted board received over the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Snapshot has {found} cells, expected {expected}")]
    CellCount { found: usize, expected: usize },

    #[error("Snapshot key has {bits} bits, at least {min} required")]
    WeakKey { bits: u64, min: u64 },
}

/// Errors from the turn state machine and arbiter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Coordinate ({x}, {y}) out of bounds, use 0-9")]
    OutOfBounds { x: i32, y: i32 },

    #[error("It is {expected}'s turn, not {attempted}'s")]
    NotYourTurn { expected: Player, attempted: Player },

    #[error("Game is already over")]
    GameAlreadyConcluded,

    #[error("Match has not started")]
    MatchNotStarted,

    #[error("Invalid player identity: {0}")]
    InvalidPlayerIdentity(String),

    #[error("{0} is already seated")]
    SeatTaken(Player),

    #[error("Boards cannot be revealed while the match is in progress")]
    MatchInProgress,

    #[error(transparent)]
    Defender(#[from] DefenderError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl GameError {
    /// Validation errors that leave the match untouched and can be retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::OutOfBounds { .. } | GameError::NotYourTurn { .. }
        )
    }
}

/// Errors from checking a revealed board against the match history
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Revealed board does not match the published commitment")]
    CommitmentMismatch,

    #[error("No commitment was published for {0}")]
    MissingCommitment(Player),

    #[error("Revealed board is invalid: {0}")]
    InvalidBoard(#[from] BoardError),

    #[error("Turn {turn}: reported {reported} at {coordinate} but the board says otherwise")]
    OutcomeMismatch {
        turn: u32,
        coordinate: Coordinate,
        reported: &'static str,
    },

    #[error("Turn {turn}: sunk report {reported:?} does not match the board")]
    SunkMismatch {
        turn: u32,
        reported: Option<String>,
    },
}

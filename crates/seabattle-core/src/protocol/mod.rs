//! Protocol types and messages.

mod messages;
mod types;

pub use messages::{
    AttackEnvelope, AuditReport, BoardReveal, EnvelopeStatus, FleetSummary, HitAnswer,
    MatchStarted, MatchTranscript, RelayTranscript, SeatRequest, ShipSummary, StatusEnvelope,
    StrikeRequest,
};
pub use types::{AttackRecord, MatchId, Outcome, Player};

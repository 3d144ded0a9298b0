//! Post-game check of a revealed board against the published commitment and
//! the answers the defender gave during the match.
//!
//! The check runs on the auditing player's side, fed with the arbiter's
//! transcript and the reveal the opponent handed over directly.

use crate::board::Board;
use crate::crypto::BoardCommitment;
use crate::error::{AuditError, GameError};
use crate::protocol::{AttackRecord, AuditReport, BoardReveal, MatchTranscript, Outcome, Player};
use tracing::warn;

/// Audit `player`'s reveal against a published transcript.
///
/// Refused while the match is still running, since a reveal would hand the
/// board to the opponent mid-game.
pub fn audit_reveal(
    transcript: &MatchTranscript,
    player: Player,
    reveal: &BoardReveal,
) -> Result<AuditReport, GameError> {
    if !transcript.concluded {
        return Err(GameError::MatchInProgress);
    }
    let result = match transcript.commitments.get(&player) {
        Some(commitment) => verify_reveal(commitment, reveal, &transcript.history, player),
        None => Err(AuditError::MissingCommitment(player)),
    };
    Ok(match result {
        Ok(()) => AuditReport {
            player,
            verified: true,
            error: None,
        },
        Err(e) => {
            warn!("Match {}: audit of {} failed: {}", transcript.match_id, player, e);
            AuditReport {
                player,
                verified: false,
                error: Some(e.to_string()),
            }
        }
    })
}

/// Verify `reveal` for `defender`.
///
/// Replays every non-duplicate attack against the revealed layout and fails
/// on the first outcome or sunk report that the layout contradicts.
pub fn verify_reveal(
    commitment: &BoardCommitment,
    reveal: &BoardReveal,
    history: &[AttackRecord],
    defender: Player,
) -> Result<(), AuditError> {
    let mut board = Board::from_layout(reveal.ships.iter().cloned())?;
    if !commitment.verify(&board.layout_bytes(), &reveal.salt) {
        return Err(AuditError::CommitmentMismatch);
    }

    let attacks = history
        .iter()
        .filter(|r| r.defender() == defender && r.outcome != Outcome::Duplicate);

    for record in attacks {
        let effect = board.record_strike(record.coordinate);
        if effect.hit != record.is_hit() {
            return Err(AuditError::OutcomeMismatch {
                turn: record.turn,
                coordinate: record.coordinate,
                reported: record.outcome.as_str(),
            });
        }
        if effect.sunk != record.ship_sunk {
            return Err(AuditError::SunkMismatch {
                turn: record.turn,
                reported: record.ship_sunk.map(|s| s.name().to_string()),
            });
        }
    }
    Ok(())
}

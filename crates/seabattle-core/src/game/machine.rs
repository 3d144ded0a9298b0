//! Per-attack resolution.

use super::{Defender, GameState, Seats};
use crate::board::Coordinate;
use crate::crypto::{blind_query, BlindingScalar};
use crate::error::GameError;
use crate::protocol::{AttackRecord, Outcome, Player};
use rand::{CryptoRng, RngCore};

/// Resolve one attack by `attacker` at `(x, y)`.
///
/// Validation failures return before anything is touched. A coordinate the
/// defender has already been struck at is recorded as a duplicate without a
/// protocol round-trip and without advancing the turn. Every other attack runs
/// the blinded hit check against the defender, updates its bookkeeping, and
/// either concludes the match or hands the turn over.
pub fn resolve_attack<D, R>(
    state: &mut GameState,
    seats: &mut Seats<D>,
    attacker: Player,
    x: i32,
    y: i32,
    rng: &mut R,
) -> Result<AttackRecord, GameError>
where
    D: Defender,
    R: RngCore + CryptoRng + ?Sized,
{
    if state.is_concluded() {
        return Err(GameError::GameAlreadyConcluded);
    }
    let coordinate = Coordinate::new(x, y).map_err(|_| GameError::OutOfBounds { x, y })?;
    if attacker != state.current_turn() {
        return Err(GameError::NotYourTurn {
            expected: state.current_turn(),
            attempted: attacker,
        });
    }

    let turn = state.total_turns();
    let defender = seats.get_mut(attacker.opponent());

    if defender.was_targeted(coordinate) {
        let record = AttackRecord {
            turn,
            attacker,
            coordinate,
            outcome: Outcome::Duplicate,
            ship_sunk: None,
        };
        state.record(record.clone());
        return Ok(record);
    }

    let snapshot = defender.snapshot();
    let scalar = BlindingScalar::sample(snapshot.public_key(), rng);
    let query = blind_query(snapshot, coordinate, scalar);
    let is_hit = defender.answer(&query)?;
    let effect = defender.record_strike(coordinate, is_hit)?;

    let record = AttackRecord {
        turn,
        attacker,
        coordinate,
        outcome: if is_hit { Outcome::Hit } else { Outcome::Miss },
        ship_sunk: effect.sunk,
    };
    state.record(record.clone());

    if effect.fleet_destroyed {
        state.conclude(attacker);
    } else {
        state.advance();
    }
    Ok(record)
}

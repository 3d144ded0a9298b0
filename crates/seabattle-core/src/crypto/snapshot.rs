//! Encrypted per-cell view of a finalized board.

use super::paillier::{Ciphertext, PublicKey, MIN_MODULUS_BITS};
use crate::board::{Board, Coordinate, CELL_COUNT};
use crate::error::SnapshotError;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `Enc(pk, cell_value)` for every cell, in row-major order.
///
/// Sealed once after placement and never mutated. Holding a snapshot reveals
/// nothing without the owner's private key, so the arbiter may keep shared
/// references to it. On the wire the cell count and key size are checked
/// before a snapshot is accepted.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "SealedCells")]
pub struct EncryptedBoard {
    key: PublicKey,
    cells: Vec<Ciphertext>,
}

impl EncryptedBoard {
    /// Encrypt every cell of `board` under `key` with fresh randomness per cell
    pub fn seal<R: RngCore + CryptoRng + ?Sized>(board: &Board, key: &PublicKey, rng: &mut R) -> Self {
        let cells = Coordinate::all()
            .map(|c| key.encrypt(board.cell(c) as u64, rng))
            .collect();
        Self {
            key: key.clone(),
            cells,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    pub fn cell(&self, coordinate: Coordinate) -> &Ciphertext {
        &self.cells[coordinate.index()]
    }
}

#[derive(Deserialize)]
struct SealedCells {
    key: PublicKey,
    cells: Vec<Ciphertext>,
}

impl TryFrom<SealedCells> for EncryptedBoard {
    type Error = SnapshotError;

    fn try_from(raw: SealedCells) -> Result<Self, Self::Error> {
        if raw.cells.len() != CELL_COUNT {
            return Err(SnapshotError::CellCount {
                found: raw.cells.len(),
                expected: CELL_COUNT,
            });
        }
        if raw.key.bits() < MIN_MODULUS_BITS {
            return Err(SnapshotError::WeakKey {
                bits: raw.key.bits(),
                min: MIN_MODULUS_BITS,
            });
        }
        Ok(Self {
            key: raw.key,
            cells: raw.cells,
        })
    }
}

impl fmt::Debug for EncryptedBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBoard({} cells, {:?})", CELL_COUNT, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ShipClass;
    use crate::crypto::KeyPair;
    use num_bigint::BigInt;
    use num_traits::{One, Zero};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seal_encrypts_every_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let keys = KeyPair::generate(256, &mut rng);
        let board = Board::from_layout([(
            ShipClass::PatrolBoat,
            vec![Coordinate::new(7, 9).unwrap(), Coordinate::new(8, 9).unwrap()],
        )])
        .unwrap();

        let snapshot = EncryptedBoard::seal(&board, &keys.public, &mut rng);
        assert_eq!(snapshot.public_key(), &keys.public);

        for c in Coordinate::all() {
            let expected = if board.has_ship(c) {
                BigInt::one()
            } else {
                BigInt::zero()
            };
            assert_eq!(keys.private.decrypt(snapshot.cell(c)), expected, "cell {}", c);
        }
    }

    #[test]
    fn test_equal_cells_have_distinct_ciphertexts() {
        let mut rng = StdRng::seed_from_u64(4);
        let keys = KeyPair::generate(256, &mut rng);
        let board = Board::random(&mut rng).unwrap();
        let snapshot = EncryptedBoard::seal(&board, &keys.public, &mut rng);

        let water: Vec<_> = Coordinate::all().filter(|c| !board.has_ship(*c)).take(2).collect();
        assert_ne!(snapshot.cell(water[0]), snapshot.cell(water[1]));
    }

    #[test]
    fn test_wire_form_checks_cell_count() {
        let mut rng = StdRng::seed_from_u64(5);
        let keys = KeyPair::generate(256, &mut rng);
        let board = Board::random(&mut rng).unwrap();
        let snapshot = EncryptedBoard::seal(&board, &keys.public, &mut rng);

        let mut json = serde_json::to_value(&snapshot).unwrap();
        let restored: EncryptedBoard = serde_json::from_value(json.clone()).unwrap();
        let c = Coordinate::new(4, 4).unwrap();
        assert_eq!(restored.cell(c), snapshot.cell(c));

        json["cells"].as_array_mut().unwrap().pop();
        let err = serde_json::from_value::<EncryptedBoard>(json).unwrap_err();
        assert!(err.to_string().contains("99 cells"), "{}", err);
    }

    #[test]
    fn test_wire_form_rejects_tiny_key() {
        let json = serde_json::json!({
            "key": "0f",
            "cells": vec!["01"; CELL_COUNT],
        });
        let err = serde_json::from_value::<EncryptedBoard>(json).unwrap_err();
        assert!(err.to_string().contains("at least"), "{}", err);
    }
}

//! Blinded homomorphic hit check.
//!
//! Given `c = Enc(cell)` from the defender's snapshot the attacker side builds
//!
//!   result = (c - HIT_GUESS) * r
//!
//! with a fresh nonzero `r`. `Dec(result)` is 0 on a ship cell and `-r` on
//! water, so the defender learns only whether it was hit and releases a single
//! bit. Building a query needs public material only; resolving it needs the
//! private key and therefore runs inside the defender.

use super::commitment::hex32;
use super::paillier::{Ciphertext, PrivateKey, PublicKey};
use super::snapshot::EncryptedBoard;
use crate::board::Coordinate;
use crate::error::DefenderError;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell value that counts as a hit
pub const HIT_GUESS: i64 = 1;

/// Nonzero multiplier masking miss results. Consumed by the query it blinds.
pub struct BlindingScalar(BigUint);

impl BlindingScalar {
    /// Uniform draw from `[1, n)`
    pub fn sample<R: RngCore + CryptoRng + ?Sized>(key: &PublicKey, rng: &mut R) -> Self {
        Self(rng.gen_biguint_range(&BigUint::one(), key.modulus()))
    }

    /// `None` for any value that is zero modulo `n`, since it would turn
    /// every answer into a hit.
    pub fn new(value: BigUint, key: &PublicKey) -> Option<Self> {
        if (&value % key.modulus()).is_zero() {
            None
        } else {
            Some(Self(value))
        }
    }
}

impl fmt::Debug for BlindingScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingScalar(..)")
    }
}

/// A blinded hit query addressed to one defender's key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlindedQuery {
    coordinate: Coordinate,
    #[serde(serialize_with = "hex32::encode", deserialize_with = "hex32::decode")]
    key_fingerprint: [u8; 32],
    ciphertext: Ciphertext,
}

impl BlindedQuery {
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }
}

/// Build the query for `coordinate` against `snapshot`.
pub fn blind_query(
    snapshot: &EncryptedBoard,
    coordinate: Coordinate,
    scalar: BlindingScalar,
) -> BlindedQuery {
    let key = snapshot.public_key();
    let difference = key.add_plain(snapshot.cell(coordinate), -HIT_GUESS);
    BlindedQuery {
        coordinate,
        key_fingerprint: key.fingerprint(),
        ciphertext: key.mul_plain(&difference, &scalar.0),
    }
}

/// Decrypt a query and report whether it hit.
pub fn resolve_query(private_key: &PrivateKey, query: &BlindedQuery) -> Result<bool, DefenderError> {
    if query.key_fingerprint != private_key.public_key().fingerprint() {
        return Err(DefenderError::ForeignQuery);
    }
    Ok(private_key.decrypt(&query.ciphertext).is_zero())
}

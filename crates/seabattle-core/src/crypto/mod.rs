//! Cryptographic building blocks.
//!
//! - Paillier keypairs and ciphertexts
//! - The encrypted board snapshot sealed once per player
//! - The blinded hit check run for every attack
//! - Board commitments checked after the match

mod commitment;
mod hit_check;
mod paillier;
mod snapshot;

pub use commitment::{BoardCommitment, Salt};
pub use hit_check::{blind_query, resolve_query, BlindedQuery, BlindingScalar, HIT_GUESS};
pub use paillier::{
    Ciphertext, KeyPair, PrivateKey, PublicKey, DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS,
};
pub use snapshot::EncryptedBoard;

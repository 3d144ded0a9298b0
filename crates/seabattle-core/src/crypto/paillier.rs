//! Paillier additively homomorphic encryption.
//!
//! g = n + 1, λ = (p-1)(q-1), μ = λ⁻¹ mod n
//!
//!   Enc(m)        = (1 + m·n) · rⁿ  mod n²
//!   Dec(c)        = L(c^λ mod n²) · μ mod n,  L(u) = (u - 1) / n
//!   Enc(a)·Enc(b) = Enc(a + b)
//!   Enc(a)^k      = Enc(k·a)
//!
//! Plaintexts live in Z_n; decryption maps the upper half of Z_n to negative
//! integers so that `Enc(0) - 1` decrypts to -1.

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Modulus size used when nothing else is configured
pub const DEFAULT_MODULUS_BITS: u64 = 2048;

/// Smallest modulus accepted by [`KeyPair::generate`]
pub const MIN_MODULUS_BITS: u64 = 128;

const MILLER_RABIN_ROUNDS: usize = 32;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Public half of a Paillier keypair. All homomorphic operations live here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PublicKey {
    n: BigUint,
    n_squared: BigUint,
}

impl PublicKey {
    /// Rebuild a public key from its modulus
    pub fn from_modulus(n: BigUint) -> Self {
        let n_squared = &n * &n;
        Self { n, n_squared }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// SHA-256 of the modulus, used to tie queries to the key they were built for
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.n.to_bytes_be());
        hasher.finalize().into()
    }

    /// Map a signed plaintext into Z_n
    fn encode(&self, m: i64) -> BigUint {
        let magnitude = BigUint::from(m.unsigned_abs()) % &self.n;
        if m >= 0 || magnitude.is_zero() {
            magnitude
        } else {
            &self.n - magnitude
        }
    }

    /// (1 + m·n) mod n², i.e. g^m
    fn g_pow(&self, m: &BigUint) -> BigUint {
        (BigUint::one() + m * &self.n) % &self.n_squared
    }

    /// Random unit of Z_n
    fn random_unit<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> BigUint {
        loop {
            let r = rng.gen_biguint_range(&BigUint::one(), &self.n);
            if r.modinv(&self.n).is_some() {
                return r;
            }
        }
    }

    /// Encrypt a non-negative plaintext
    pub fn encrypt<R: RngCore + CryptoRng + ?Sized>(&self, m: u64, rng: &mut R) -> Ciphertext {
        let r = self.random_unit(rng);
        let mask = r.modpow(&self.n, &self.n_squared);
        Ciphertext((self.g_pow(&BigUint::from(m)) * mask) % &self.n_squared)
    }

    /// Enc(a) ⊕ Enc(b) = Enc(a + b)
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        Ciphertext((&a.0 * &b.0) % &self.n_squared)
    }

    /// Enc(a) ⊕ k = Enc(a + k)
    pub fn add_plain(&self, c: &Ciphertext, k: i64) -> Ciphertext {
        Ciphertext((&c.0 * self.g_pow(&self.encode(k))) % &self.n_squared)
    }

    /// Enc(a) ⊗ k = Enc(k·a)
    pub fn mul_plain(&self, c: &Ciphertext, k: &BigUint) -> Ciphertext {
        Ciphertext(c.0.modpow(k, &self.n_squared))
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        hex::encode(key.n.to_bytes_be())
    }
}

impl TryFrom<String> for PublicKey {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::from_modulus(BigUint::from_bytes_be(&hex::decode(s)?)))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({} bits, {})",
            self.bits(),
            hex::encode(&self.fingerprint()[..8])
        )
    }
}

/// Private half of a Paillier keypair. Never serialized.
#[derive(Clone)]
pub struct PrivateKey {
    public: PublicKey,
    lambda: BigUint,
    mu: BigUint,
}

impl PrivateKey {
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Decrypt to a signed integer in (-n/2, n/2]
    pub fn decrypt(&self, c: &Ciphertext) -> BigInt {
        let n = &self.public.n;
        let u = c.0.modpow(&self.lambda, &self.public.n_squared);
        let l = (u - BigUint::one()) / n;
        let m = (l * &self.mu) % n;

        let half = n >> 1u32;
        if m > half {
            BigInt::from_biguint(Sign::Plus, m) - BigInt::from_biguint(Sign::Plus, n.clone())
        } else {
            BigInt::from_biguint(Sign::Plus, m)
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(for {:?})", self.public)
    }
}

/// Paillier keypair
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generate a keypair whose modulus has exactly `bits` bits
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(bits: u64, rng: &mut R) -> Self {
        let bits = bits.max(MIN_MODULUS_BITS);
        let p_bits = bits / 2;
        let q_bits = bits - p_bits;

        loop {
            let p = random_prime(p_bits, rng);
            let q = random_prime(q_bits, rng);
            if p == q {
                continue;
            }

            let n = &p * &q;
            if n.bits() != bits {
                continue;
            }

            let lambda = (&p - BigUint::one()) * (&q - BigUint::one());
            let Some(mu) = lambda.modinv(&n) else {
                continue;
            };

            let public = PublicKey::from_modulus(n);
            let private = PrivateKey {
                public: public.clone(),
                lambda,
                mu,
            };
            return Self { public, private };
        }
    }
}

/// A Paillier ciphertext, an element of Z*_{n²}
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ciphertext(BigUint);

impl From<Ciphertext> for String {
    fn from(c: Ciphertext) -> Self {
        hex::encode(c.to_bytes())
    }
}

impl TryFrom<String> for Ciphertext {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::from_bytes(&hex::decode(s)?))
    }
}

impl Ciphertext {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_bytes_be();
        write!(f, "Ciphertext({})", hex::encode(&bytes[..bytes.len().min(8)]))
    }
}

fn random_prime<R: RngCore + CryptoRng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    // Top two bits set so the product of two such primes has full length.
    let top = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));
    loop {
        let candidate = rng.gen_biguint(bits) | &top | BigUint::one();
        if is_probable_prime(&candidate, rng) {
            return candidate;
        }
    }
}

/// Miller-Rabin with trial division by small primes
pub(crate) fn is_probable_prime<R: RngCore + CryptoRng + ?Sized>(n: &BigUint, rng: &mut R) -> bool {
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }
    if n == &two {
        return true;
    }
    if (n % &two).is_zero() {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - BigUint::one();
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

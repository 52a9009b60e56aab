//! Oracle and account key material.
//!
//! Private keys are scalars over BN254; public keys are points on G1. The
//! oracle signing key is read from the `PRIVATE_KEY` environment variable
//! (base58) and falls back to a hardcoded development key when unset. The
//! fallback is deliberate and must be logged by the caller; it keeps local
//! runs working without secrets while never applying to malformed values.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{CurveGroup, Group};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use ark_std::UniformRand;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;

use crate::field::bytes_to_field;

/// Environment variable holding the base58 oracle signing key.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Development fallback signing key, used when `PRIVATE_KEY` is unset.
/// Publicly visible by definition; never use it outside local runs.
pub const DEV_PRIVATE_KEY: &str = "EKF65JKw9Q1XWLDZyZNGysBbYG21QbJf3a4xnEoZPZ28LKYGMw53";

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors that can occur while decoding key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid base58 private key: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),

    #[error("invalid point encoding: {0}")]
    InvalidPoint(String),
}

/// Where the oracle signing key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    DevFallback,
}

/// A signing key: a scalar over the BN254 scalar field.
#[derive(Clone)]
pub struct PrivateKey {
    scalar: Fr,
}

impl PrivateKey {
    /// Decode a base58 private key string.
    pub fn from_base58(s: &str) -> KeyResult<Self> {
        let bytes = bs58::decode(s).into_vec()?;
        Ok(Self {
            scalar: bytes_to_field(&bytes),
        })
    }

    /// Generate a fresh random key (contract addresses, test accounts).
    pub fn random() -> Self {
        let mut rng = StdRng::from_entropy();
        Self {
            scalar: Fr::rand(&mut rng),
        }
    }

    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            point: (G1Projective::generator() * self.scalar).into_affine(),
        }
    }

    pub(crate) fn scalar(&self) -> Fr {
        self.scalar
    }
}

// Keep the scalar out of debug output.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A verification key: a point on BN254 G1, rendered as compressed hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    point: G1Affine,
}

impl PublicKey {
    /// Compressed point bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.point.serialize_compressed(&mut bytes).unwrap();
        bytes
    }

    /// Compressed point as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse a compressed hex point.
    pub fn from_hex(s: &str) -> KeyResult<Self> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidPoint(e.to_string()))?;
        let point = G1Affine::deserialize_compressed(&bytes[..])
            .map_err(|e| KeyError::InvalidPoint(e.to_string()))?;
        Ok(Self { point })
    }

    pub(crate) fn point(&self) -> G1Affine {
        self.point
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Load the oracle signing key from `PRIVATE_KEY`, falling back to
/// [`DEV_PRIVATE_KEY`] when the variable is unset.
///
/// A present-but-malformed value is an error rather than a fallback, so a
/// typo cannot silently downgrade a deployment to the public dev key.
pub fn oracle_key_from_env() -> KeyResult<(PrivateKey, KeySource)> {
    let encoded = env::var(PRIVATE_KEY_ENV).ok();
    oracle_key_from_value(encoded.as_deref())
}

/// Decode the oracle key from an optional `PRIVATE_KEY` value.
fn oracle_key_from_value(encoded: Option<&str>) -> KeyResult<(PrivateKey, KeySource)> {
    match encoded {
        Some(encoded) => Ok((PrivateKey::from_base58(encoded)?, KeySource::Environment)),
        None => Ok((
            PrivateKey::from_base58(DEV_PRIVATE_KEY)?,
            KeySource::DevFallback,
        )),
    }
}

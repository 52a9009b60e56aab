//! Schnorr-style signatures over sequences of field elements.
//!
//! The oracle attests to `(id, age)` by signing the two field elements in
//! order. The challenge is a Poseidon hash binding the nonce commitment,
//! the public key, and the message, so reusing a signature with any other
//! `(id, age)` pair fails verification. The nonce itself is derived from
//! the private key and the message, making signatures deterministic.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup, Group};
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::field::{bytes_to_field, decimal_to_field, field_to_decimal, PoseidonHasher};
use crate::keys::{PrivateKey, PublicKey};

/// A signature over an ordered list of field elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Nonce commitment `R = k * G`.
    r: G1Affine,
    /// Response scalar `s = k + e * sk`.
    s: Fr,
}

impl Signature {
    /// Sign a message with the given private key.
    pub fn create(key: &PrivateKey, message: &[Fr]) -> Self {
        let hasher = PoseidonHasher::new();
        let sk = key.scalar();

        // Deterministic nonce bound to the key and the exact message.
        let mut nonce_input = Vec::with_capacity(message.len() + 1);
        nonce_input.push(sk);
        nonce_input.extend_from_slice(message);
        let k = hasher.hash_many(&nonce_input);

        let r = (G1Projective::generator() * k).into_affine();
        let e = challenge(&hasher, &r, &key.public_key(), message);

        Self { r, s: k + e * sk }
    }

    /// Check this signature against a public key and message.
    pub fn verify(&self, public_key: &PublicKey, message: &[Fr]) -> bool {
        let hasher = PoseidonHasher::new();
        let e = challenge(&hasher, &self.r, public_key, message);

        let lhs = G1Projective::generator() * self.s;
        let rhs = self.r.into_group() + public_key.point().into_group() * e;
        lhs.into_affine() == rhs.into_affine()
    }
}

/// Challenge scalar `e = H(R, PK, message)`.
fn challenge(hasher: &PoseidonHasher, r: &G1Affine, public_key: &PublicKey, message: &[Fr]) -> Fr {
    let pk = public_key.point();
    let mut input = Vec::with_capacity(message.len() + 4);
    input.push(coordinate_to_scalar(r));
    input.push(coordinate_to_scalar(&pk));
    input.extend_from_slice(message);
    hasher.hash_many(&input)
}

/// Fold a point's affine coordinates into the scalar field.
fn coordinate_to_scalar(point: &G1Affine) -> Fr {
    match point.xy() {
        Some((x, y)) => {
            let mut bytes = x.into_bigint().to_bytes_be();
            bytes.extend(y.into_bigint().to_bytes_be());
            bytes_to_field(&bytes)
        }
        // Point at infinity; unreachable for honest keys and nonces.
        None => Fr::from(0u64),
    }
}

/// JSON shape: `{ "r": "<compressed hex point>", "s": "<decimal scalar>" }`.
#[derive(Serialize, Deserialize)]
struct SignatureJson {
    r: String,
    s: String,
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut r_bytes = Vec::new();
        self.r.serialize_compressed(&mut r_bytes).unwrap();
        SignatureJson {
            r: hex::encode(r_bytes),
            s: field_to_decimal(&self.s),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = SignatureJson::deserialize(deserializer)?;
        let r_bytes = hex::decode(&json.r).map_err(de::Error::custom)?;
        let r = G1Affine::deserialize_compressed(&r_bytes[..])
            .map_err(|e| de::Error::custom(format!("invalid nonce commitment: {e}")))?;
        let s = decimal_to_field(&json.s)
            .ok_or_else(|| de::Error::custom("response scalar is not a decimal string"))?;
        Ok(Self { r, s })
    }
}

//! BN254 scalar field helpers: Poseidon hashing and string conversions.
//!
//! Claims are encoded as field elements and rendered as decimal strings in
//! JSON, matching the oracle wire format.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::{Field, PrimeField};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Poseidon hasher configured for the BN254 scalar field.
#[derive(Clone)]
pub struct PoseidonHasher {
    config: PoseidonConfig<Fr>,
}

impl PoseidonHasher {
    /// Create a new Poseidon hasher with default parameters.
    pub fn new() -> Self {
        Self {
            config: Self::default_config(),
        }
    }

    /// Default Poseidon configuration for BN254 (rate 2, capacity 1).
    fn default_config() -> PoseidonConfig<Fr> {
        let full_rounds = 8;
        let partial_rounds = 57;
        let alpha = 5;
        let rate = 2;
        let capacity = 1;

        let (ark, mds) = Self::generate_parameters(rate + capacity, full_rounds, partial_rounds);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha: alpha as u64,
            ark,
            mds,
            rate,
            capacity,
        }
    }

    /// Generate Poseidon round constants and MDS matrix.
    fn generate_parameters(
        width: usize,
        full_rounds: u32,
        partial_rounds: u32,
    ) -> (Vec<Vec<Fr>>, Vec<Vec<Fr>>) {
        let total_rounds = (full_rounds + partial_rounds) as usize;

        let mut ark = Vec::with_capacity(total_rounds);
        for r in 0..total_rounds {
            let mut round_constants = Vec::with_capacity(width);
            for i in 0..width {
                let seed = ((r * width + i) as u64).wrapping_mul(0x9e3779b97f4a7c15);
                round_constants.push(Fr::from(seed));
            }
            ark.push(round_constants);
        }

        // Cauchy-style matrix; invertible for distinct row/column seeds.
        let mut mds = Vec::with_capacity(width);
        for i in 0..width {
            let mut row = Vec::with_capacity(width);
            for j in 0..width {
                let x = Fr::from((i + 1) as u64);
                let y = Fr::from((width + j + 1) as u64);
                row.push((x + y).inverse().unwrap_or(Fr::from(1u64)));
            }
            mds.push(row);
        }

        (ark, mds)
    }

    /// Hash a sequence of field elements into one. Order-sensitive.
    pub fn hash_many(&self, elements: &[Fr]) -> Fr {
        let mut sponge = PoseidonSponge::new(&self.config);
        for elem in elements {
            sponge.absorb(elem);
        }
        sponge.squeeze_field_elements(1)[0]
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert big-endian bytes to a field element (reduced mod the field order).
pub fn bytes_to_field(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Parse a decimal string into a field element.
///
/// Accepts any non-empty ASCII digit string; values beyond the field order
/// wrap modulo the order, like the original oracle's numeric coercion.
pub fn decimal_to_field(s: &str) -> Option<Fr> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let ten = Fr::from(10u64);
    let mut acc = Fr::from(0u64);
    for b in s.bytes() {
        acc = acc * ten + Fr::from((b - b'0') as u64);
    }
    Some(acc)
}

/// Render a field element as a decimal string.
pub fn field_to_decimal(f: &Fr) -> String {
    f.into_bigint().to_string()
}

/// A field element that serializes as a decimal string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FieldElem(pub Fr);

impl From<Fr> for FieldElem {
    fn from(f: Fr) -> Self {
        Self(f)
    }
}

impl From<u64> for FieldElem {
    fn from(v: u64) -> Self {
        Self(Fr::from(v))
    }
}

impl fmt::Display for FieldElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", field_to_decimal(&self.0))
    }
}

impl fmt::Debug for FieldElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElem({})", field_to_decimal(&self.0))
    }
}

impl Serialize for FieldElem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&field_to_decimal(&self.0))
    }
}

impl<'de> Deserialize<'de> for FieldElem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        decimal_to_field(&s)
            .map(FieldElem)
            .ok_or_else(|| de::Error::custom(format!("not a decimal field element: {s:?}")))
    }
}

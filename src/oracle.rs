//! The age data provider: looks up a user's age and signs the claim.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::field::{decimal_to_field, FieldElem};
use crate::keys::{PrivateKey, PublicKey};
use crate::signature::Signature;

/// Age returned for every user id without a table entry.
pub const FALLBACK_AGE: u16 = 15;

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors that can occur while building a signed claim.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("user id must be a decimal integer, got {0:?}")]
    InvalidUserId(String),
}

/// The `(id, age)` pair covered by a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimData {
    pub id: FieldElem,
    pub age: FieldElem,
}

/// A signed age attestation: the claim, the signature over exactly
/// `[id, age]`, and the oracle public key it verifies against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedClaim {
    pub data: ClaimData,
    pub signature: Signature,
    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,
}

/// The trusted data provider. Holds the oracle signing key; the age table
/// itself is static.
pub struct AgeOracle {
    key: PrivateKey,
}

impl AgeOracle {
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }

    /// The public key claims verify against.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Static age table: user `"1"` is 25, everyone else gets the fallback.
    ///
    /// Stands in for a real KYC lookup; the two entries cover one user on
    /// each side of the verification threshold.
    pub fn known_age(user_id: &str) -> u16 {
        if user_id == "1" {
            25
        } else {
            FALLBACK_AGE
        }
    }

    /// Look up the user's age and sign the `(id, age)` claim.
    ///
    /// The id must be a decimal integer so it can be encoded as a field
    /// element; anything else is rejected up front.
    pub fn signed_age(&self, user_id: &str) -> OracleResult<SignedClaim> {
        let id = decimal_to_field(user_id)
            .ok_or_else(|| OracleError::InvalidUserId(user_id.to_string()))?;
        let age = Fr::from(Self::known_age(user_id) as u64);

        let signature = Signature::create(&self.key, &[id, age]);

        Ok(SignedClaim {
            data: ClaimData {
                id: id.into(),
                age: age.into(),
            },
            signature,
            public_key: self.public_key(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::DEV_PRIVATE_KEY;

    fn oracle() -> AgeOracle {
        AgeOracle::new(PrivateKey::from_base58(DEV_PRIVATE_KEY).unwrap())
    }

    #[test]
    fn age_table() {
        assert_eq!(AgeOracle::known_age("1"), 25);
        assert_eq!(AgeOracle::known_age("2"), FALLBACK_AGE);
        assert_eq!(AgeOracle::known_age("999999"), FALLBACK_AGE);
        assert_eq!(AgeOracle::known_age("42"), FALLBACK_AGE);
    }

    #[test]
    fn claim_verifies_against_oracle_key() {
        let oracle = oracle();
        let claim = oracle.signed_age("1").unwrap();

        assert_eq!(claim.data.id, FieldElem::from(1u64));
        assert_eq!(claim.data.age, FieldElem::from(25u64));
        assert_eq!(claim.public_key, oracle.public_key());
        assert!(claim
            .signature
            .verify(&claim.public_key, &[claim.data.id.0, claim.data.age.0]));
    }

    #[test]
    fn rejects_non_numeric_id() {
        let err = oracle().signed_age("alice").unwrap_err();
        assert!(matches!(err, OracleError::InvalidUserId(_)));
    }

    #[test]
    fn claim_json_shape() {
        let claim = oracle().signed_age("2").unwrap();
        let json = serde_json::to_value(&claim).unwrap();

        assert_eq!(json["data"]["id"], "2");
        assert_eq!(json["data"]["age"], "15");
        assert!(json["signature"]["r"].is_string());
        assert!(json["signature"]["s"].is_string());
        assert!(json["publicKey"].is_string());
    }
}

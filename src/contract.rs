//! The age verifier contract, simulated in-process.
//!
//! Stands in for the on-chain program: it stores the oracle public key at
//! init time, checks signed claims against it, and emits a `Verified`
//! event when the age exceeds the threshold. The proving system that
//! would wrap these checks on a real chain is out of scope.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::Serialize;

use crate::field::{field_to_decimal, FieldElem};
use crate::keys::PublicKey;
use crate::signature::Signature;

/// Minimum age, exclusive: a claim verifies only if age > 18.
pub const AGE_THRESHOLD: u16 = 18;

/// Result type for contract calls.
pub type ContractResult<T> = Result<T, ContractError>;

/// Ways a contract call can reject.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("contract is not initialized with an oracle key")]
    Uninitialized,

    #[error("contract is already initialized")]
    AlreadyInitialized,

    #[error("signature does not match the oracle key over (id, age)")]
    InvalidSignature,

    #[error("age {0} does not exceed threshold {threshold}", threshold = AGE_THRESHOLD)]
    BelowThreshold(String),
}

/// Event emitted for each successfully verified claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedEvent {
    /// The verified user's id, as encoded in the claim.
    pub id: FieldElem,
}

/// The verifier contract state.
#[derive(Clone, Debug, Default)]
pub struct AgeVerifier {
    oracle_public_key: Option<PublicKey>,
}

impl AgeVerifier {
    /// One-time setup: store the oracle public key.
    pub fn init(&mut self, oracle_public_key: PublicKey) -> ContractResult<()> {
        if self.oracle_public_key.is_some() {
            return Err(ContractError::AlreadyInitialized);
        }
        self.oracle_public_key = Some(oracle_public_key);
        Ok(())
    }

    /// State read: the stored oracle public key.
    pub fn oracle_public_key(&self) -> ContractResult<PublicKey> {
        self.oracle_public_key.ok_or(ContractError::Uninitialized)
    }

    /// Check a signed `(id, age)` claim.
    ///
    /// The signature must validate against the stored oracle key over
    /// exactly `[id, age]`, and the age must exceed [`AGE_THRESHOLD`].
    /// Returns the event to emit; either failure rejects the call.
    pub fn verify(&self, id: Fr, age: Fr, signature: &Signature) -> ContractResult<VerifiedEvent> {
        let oracle_key = self.oracle_public_key()?;

        if !signature.verify(&oracle_key, &[id, age]) {
            return Err(ContractError::InvalidSignature);
        }

        let threshold = Fr::from(AGE_THRESHOLD as u64);
        if age.into_bigint() <= threshold.into_bigint() {
            return Err(ContractError::BelowThreshold(field_to_decimal(&age)));
        }

        Ok(VerifiedEvent { id: id.into() })
    }
}

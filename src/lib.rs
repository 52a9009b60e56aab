//! Age oracle demo: sign `(id, age)` claims, verify them on a local chain.
//!
//! A user's age is looked up in a static table and attested to by signing
//! the `(id, age)` pair as two field elements. A simulated verifier
//! contract checks the signature against the stored oracle key and emits
//! an event when the age exceeds the threshold.
//!
//! # Architecture
//!
//! 1. HTTP request names a user id
//! 2. The oracle looks up the age and signs `[id, age]`
//! 3. A verification transaction is submitted to the local chain
//! 4. The verifier contract checks signature and threshold, emits an event

pub mod chain;
pub mod config;
pub mod contract;
pub mod field;
pub mod http;
pub mod keys;
pub mod oracle;
pub mod signature;

// Re-export main types
pub use chain::LocalChain;
pub use contract::AgeVerifier;
pub use oracle::AgeOracle;

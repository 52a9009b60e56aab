//! In-memory local test chain.
//!
//! Simulates just enough of the target chain for development and tests:
//! pre-funded accounts, a build/prove/sign/send transaction lifecycle,
//! contract deployment, and an event log. Transactions are atomic; a
//! failing operation rejects the whole transaction and emits nothing.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::contract::{AgeVerifier, ContractError, VerifiedEvent};
use crate::keys::{PrivateKey, PublicKey};
use crate::oracle::SignedClaim;
use crate::signature::Signature;
use ark_bn254::Fr;

/// Number of pre-funded accounts on a fresh chain.
pub const TEST_ACCOUNTS: usize = 10;

/// Starting balance of each test account.
pub const TEST_ACCOUNT_FUNDS: u64 = 1_000_000_000;

/// Fee charged to the sender for creating a new account.
pub const ACCOUNT_CREATION_FEE: u64 = 1_000_000;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Ways a transaction can be rejected.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("unknown account {0}")]
    UnknownAccount(Address),

    #[error("account {0} already exists")]
    AccountExists(Address),

    #[error("account {address} has {balance}, needs {required}")]
    InsufficientBalance {
        address: Address,
        balance: u64,
        required: u64,
    },

    #[error("no contract deployed at {0}")]
    NoContract(Address),

    #[error("contract already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("transaction was not proved before send")]
    NotProved,

    #[error("transaction is missing a signature from {0}")]
    MissingSignature(Address),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// A 20-byte account address derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Address([u8; 20]);

impl Address {
    /// Derive an address: the first 20 bytes of SHA-256 over the
    /// compressed public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Sha256::digest(key.to_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A pre-funded account usable as a transaction sender.
#[derive(Clone, Debug)]
pub struct TestAccount {
    pub key: PrivateKey,
    pub address: Address,
}

/// One operation inside a transaction.
#[derive(Clone, Debug)]
pub enum Operation {
    /// Create and fund a fresh account, charging the sender the creation fee.
    FundNewAccount { address: Address },
    /// Put a new (uninitialized) verifier contract at the address.
    Deploy { address: Address },
    /// Store the oracle public key in the contract at the address.
    Init {
        address: Address,
        oracle_public_key: PublicKey,
    },
    /// Call the verifier with a signed `(id, age)` claim.
    Verify {
        contract: Address,
        id: Fr,
        age: Fr,
        signature: Signature,
    },
}

/// A transaction under construction: built, then proved, signed, and sent.
#[derive(Debug)]
pub struct Transaction {
    sender: Address,
    operations: Vec<Operation>,
    proved: bool,
    signers: Vec<Address>,
}

impl Transaction {
    /// Generate the transaction proof.
    ///
    /// Real proof generation belongs to the external proving system; the
    /// local chain runs with proofs disabled, so this only marks the
    /// transaction as proved.
    pub fn prove(&mut self) {
        self.proved = true;
    }

    /// Add a signature from the given key (the sender signs implicitly).
    pub fn sign(&mut self, key: &PrivateKey) {
        self.signers.push(Address::from_public_key(&key.public_key()));
    }

    /// Submit the transaction, applying all operations atomically.
    ///
    /// Returns the events emitted by contract calls. On any failure the
    /// chain is left untouched and no events are recorded.
    pub fn send(self, chain: &mut LocalChain) -> ChainResult<Vec<VerifiedEvent>> {
        if !self.proved {
            return Err(ChainError::NotProved);
        }

        // Execute against scratch state, commit only on full success.
        let mut balances = chain.balances.clone();
        let mut contracts = chain.contracts.clone();
        let mut emitted: Vec<(Address, VerifiedEvent)> = Vec::new();

        for op in &self.operations {
            match op {
                Operation::FundNewAccount { address } => {
                    if balances.contains_key(address) {
                        return Err(ChainError::AccountExists(*address));
                    }
                    let balance = balances
                        .get_mut(&self.sender)
                        .ok_or(ChainError::UnknownAccount(self.sender))?;
                    if *balance < ACCOUNT_CREATION_FEE {
                        return Err(ChainError::InsufficientBalance {
                            address: self.sender,
                            balance: *balance,
                            required: ACCOUNT_CREATION_FEE,
                        });
                    }
                    *balance -= ACCOUNT_CREATION_FEE;
                    balances.insert(*address, 0);
                }
                Operation::Deploy { address } => {
                    // Deployment must carry the contract key's signature.
                    if !self.signers.contains(address) {
                        return Err(ChainError::MissingSignature(*address));
                    }
                    if contracts.contains_key(address) {
                        return Err(ChainError::AlreadyDeployed(*address));
                    }
                    contracts.insert(*address, AgeVerifier::default());
                }
                Operation::Init {
                    address,
                    oracle_public_key,
                } => {
                    let contract = contracts
                        .get_mut(address)
                        .ok_or(ChainError::NoContract(*address))?;
                    contract.init(*oracle_public_key)?;
                }
                Operation::Verify {
                    contract,
                    id,
                    age,
                    signature,
                } => {
                    let verifier = contracts
                        .get(contract)
                        .ok_or(ChainError::NoContract(*contract))?;
                    let event = verifier.verify(*id, *age, signature)?;
                    emitted.push((*contract, event));
                }
            }
        }

        chain.balances = balances;
        chain.contracts = contracts;
        let events = emitted.iter().map(|(_, e)| e.clone()).collect();
        chain.events.extend(emitted);
        Ok(events)
    }
}

/// The local chain: balances, deployed contracts, and the event log.
pub struct LocalChain {
    balances: HashMap<Address, u64>,
    contracts: HashMap<Address, AgeVerifier>,
    events: Vec<(Address, VerifiedEvent)>,
    test_accounts: Vec<TestAccount>,
}

impl LocalChain {
    /// Create a fresh chain with [`TEST_ACCOUNTS`] pre-funded accounts.
    pub fn new() -> Self {
        let mut balances = HashMap::new();
        let mut test_accounts = Vec::with_capacity(TEST_ACCOUNTS);

        for _ in 0..TEST_ACCOUNTS {
            let key = PrivateKey::random();
            let address = Address::from_public_key(&key.public_key());
            balances.insert(address, TEST_ACCOUNT_FUNDS);
            test_accounts.push(TestAccount { key, address });
        }

        Self {
            balances,
            contracts: HashMap::new(),
            events: Vec::new(),
            test_accounts,
        }
    }

    /// A pre-funded test account, if the index is in range.
    pub fn test_account(&self, index: usize) -> Option<TestAccount> {
        self.test_accounts.get(index).cloned()
    }

    /// Current balance of an account (0 if unknown).
    pub fn balance(&self, address: Address) -> u64 {
        self.balances.get(&address).copied().unwrap_or(0)
    }

    /// Begin a transaction from the given sender.
    pub fn transaction(&self, sender: &TestAccount, operations: Vec<Operation>) -> Transaction {
        Transaction {
            sender: sender.address,
            operations,
            proved: false,
            signers: vec![sender.address],
        }
    }

    /// The oracle public key stored in the contract at `address`.
    pub fn oracle_public_key(&self, address: Address) -> ChainResult<PublicKey> {
        let contract = self
            .contracts
            .get(&address)
            .ok_or(ChainError::NoContract(address))?;
        Ok(contract.oracle_public_key()?)
    }

    /// Events emitted by the contract at `address`, oldest first.
    pub fn events(&self, address: Address) -> Vec<VerifiedEvent> {
        self.events
            .iter()
            .filter(|(at, _)| *at == address)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Deploy and initialize an [`AgeVerifier`] in one transaction: fund
    /// the contract account, deploy, and store the oracle public key.
    ///
    /// Note the key stored at init is the oracle's, not the deployer's.
    pub fn deploy_age_verifier(
        &mut self,
        deployer: &TestAccount,
        contract_key: &PrivateKey,
        oracle_public_key: PublicKey,
    ) -> ChainResult<Address> {
        let address = Address::from_public_key(&contract_key.public_key());
        log::debug!("deploying verifier contract at {address}");

        let mut txn = self.transaction(
            deployer,
            vec![
                Operation::FundNewAccount { address },
                Operation::Deploy { address },
                Operation::Init {
                    address,
                    oracle_public_key,
                },
            ],
        );
        txn.prove();
        txn.sign(contract_key);
        txn.send(self)?;

        Ok(address)
    }

    /// Submit a signed claim to the verifier at `contract`, awaiting the
    /// full prove/sign/send lifecycle. Returns the emitted event.
    pub fn submit_verification(
        &mut self,
        sender: &TestAccount,
        contract: Address,
        claim: &SignedClaim,
    ) -> ChainResult<VerifiedEvent> {
        let mut txn = self.transaction(
            sender,
            vec![Operation::Verify {
                contract,
                id: claim.data.id.0,
                age: claim.data.age.0,
                signature: claim.signature.clone(),
            }],
        );
        txn.prove();
        let mut events = txn.send(self)?;

        // A verify transaction emits exactly one event.
        Ok(events.remove(0))
    }
}

impl Default for LocalChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElem;
    use crate::keys::DEV_PRIVATE_KEY;
    use crate::oracle::AgeOracle;

    fn oracle() -> AgeOracle {
        AgeOracle::new(PrivateKey::from_base58(DEV_PRIVATE_KEY).unwrap())
    }

    fn deployed() -> (LocalChain, TestAccount, Address) {
        let mut chain = LocalChain::new();
        let deployer = chain.test_account(0).unwrap();
        let contract_key = PrivateKey::random();
        let address = chain
            .deploy_age_verifier(&deployer, &contract_key, oracle().public_key())
            .unwrap();
        (chain, deployer, address)
    }

    #[test]
    fn deploy_stores_oracle_key_and_charges_fee() {
        let (chain, deployer, address) = deployed();

        assert_eq!(
            chain.oracle_public_key(address).unwrap(),
            oracle().public_key()
        );
        assert_eq!(
            chain.balance(deployer.address),
            TEST_ACCOUNT_FUNDS - ACCOUNT_CREATION_FEE
        );
        assert_eq!(chain.balance(address), 0);
    }

    #[test]
    fn deploy_requires_contract_key_signature() {
        let mut chain = LocalChain::new();
        let deployer = chain.test_account(0).unwrap();
        let contract_key = PrivateKey::random();
        let address = Address::from_public_key(&contract_key.public_key());

        let mut txn = chain.transaction(
            &deployer,
            vec![
                Operation::FundNewAccount { address },
                Operation::Deploy { address },
            ],
        );
        txn.prove();
        // No txn.sign(&contract_key).
        let err = txn.send(&mut chain).unwrap_err();
        assert!(matches!(err, ChainError::MissingSignature(a) if a == address));

        // The fund operation was rolled back with the rest.
        assert_eq!(chain.balance(deployer.address), TEST_ACCOUNT_FUNDS);
    }

    #[test]
    fn unproved_transaction_is_rejected() {
        let (mut chain, deployer, address) = deployed();
        let claim = oracle().signed_age("1").unwrap();

        let txn = chain.transaction(
            &deployer,
            vec![Operation::Verify {
                contract: address,
                id: claim.data.id.0,
                age: claim.data.age.0,
                signature: claim.signature.clone(),
            }],
        );
        let err = txn.send(&mut chain).unwrap_err();
        assert!(matches!(err, ChainError::NotProved));
    }

    #[test]
    fn verification_emits_event_into_the_log() {
        let (mut chain, deployer, address) = deployed();
        let claim = oracle().signed_age("1").unwrap();

        let event = chain
            .submit_verification(&deployer, address, &claim)
            .unwrap();
        assert_eq!(event.id, FieldElem::from(1u64));
        assert_eq!(chain.events(address), vec![event]);
    }

    #[test]
    fn rejected_verification_leaves_no_events() {
        let (mut chain, deployer, address) = deployed();
        let claim = oracle().signed_age("2").unwrap();

        let err = chain
            .submit_verification(&deployer, address, &claim)
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::Contract(ContractError::BelowThreshold(_))
        ));
        assert!(chain.events(address).is_empty());
    }

    #[test]
    fn verify_against_missing_contract_fails() {
        let mut chain = LocalChain::new();
        let sender = chain.test_account(1).unwrap();
        let nowhere = Address::from_public_key(&PrivateKey::random().public_key());
        let claim = oracle().signed_age("1").unwrap();

        let err = chain
            .submit_verification(&sender, nowhere, &claim)
            .unwrap_err();
        assert!(matches!(err, ChainError::NoContract(a) if a == nowhere));
    }

    #[test]
    fn fresh_chain_has_funded_accounts() {
        let chain = LocalChain::new();
        for i in 0..TEST_ACCOUNTS {
            let account = chain.test_account(i).unwrap();
            assert_eq!(chain.balance(account.address), TEST_ACCOUNT_FUNDS);
        }
        assert!(chain.test_account(TEST_ACCOUNTS).is_none());
    }
}

//! HTTP façade: liveness, the stored oracle public key, and signed-age
//! verification.
//!
//! All state is passed in through [`AppState`]; nothing lives in module
//! globals, so each test can build its own chain and router.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chain::{Address, ChainError, LocalChain, TestAccount};
use crate::keys::PublicKey;
use crate::oracle::{AgeOracle, SignedClaim};

/// Everything the handlers need: the oracle, the chain, and the deployed
/// contract's location.
pub struct AppState {
    pub oracle: AgeOracle,
    pub chain: RwLock<LocalChain>,
    pub deployer: TestAccount,
    pub contract: Address,
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    error: &'static str,
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "invalid_argument",
            detail: msg.into(),
        }),
    )
}

fn forbidden(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody {
            error: "verification_failed",
            detail: msg.into(),
        }),
    )
}

fn internal_err(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal",
            detail: msg.into(),
        }),
    )
}

/// Build the router over shared application state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/pubkey", get(pubkey))
        .route("/user/{id}/{session}/age", get(user_age))
        .route("/user/{id}/{session}/claim", get(user_claim))
        .with_state(state)
}

/// Liveness probe.
async fn root() -> &'static str {
    "Hello, World!"
}

/// The oracle public key stored in the deployed contract's state.
async fn pubkey(State(state): State<SharedState>) -> Result<Json<PublicKey>, ApiError> {
    let chain = state.chain.read().await;
    let key = chain
        .oracle_public_key(state.contract)
        .map_err(|e| internal_err(e.to_string()))?;
    Ok(Json(key))
}

/// The signed claim for a user, without any on-chain submission.
async fn user_claim(
    State(state): State<SharedState>,
    Path((id, _session)): Path<(String, String)>,
) -> Result<Json<SignedClaim>, ApiError> {
    let claim = state
        .oracle
        .signed_age(&id)
        .map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(claim))
}

/// Sign the user's age and verify it on-chain before greeting them.
///
/// The verification transaction is awaited; a contract rejection maps to
/// 403 rather than leaking through as an unhandled failure.
async fn user_age(
    State(state): State<SharedState>,
    Path((id, session)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let claim = state
        .oracle
        .signed_age(&id)
        .map_err(|e| bad_request(e.to_string()))?;

    let mut chain = state.chain.write().await;
    match chain.submit_verification(&state.deployer, state.contract, &claim) {
        Ok(event) => {
            log::info!("verified user {id} (event id {})", event.id);
            Ok(format!(
                "Hello user {id}, authenticated with session {session}!"
            ))
        }
        Err(ChainError::Contract(e)) => {
            log::info!("verification rejected for user {id}: {e}");
            Err(forbidden(e.to_string()))
        }
        Err(e) => Err(internal_err(e.to_string())),
    }
}

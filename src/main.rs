use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;

use age_oracle::chain::LocalChain;
use age_oracle::config::Config;
use age_oracle::http::{self, AppState};
use age_oracle::keys::{oracle_key_from_env, KeySource, PrivateKey, PRIVATE_KEY_ENV};
use age_oracle::oracle::AgeOracle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cfg = Config::parse();

    let (oracle_key, source) = oracle_key_from_env().context("failed to load oracle key")?;
    if source == KeySource::DevFallback {
        log::warn!(
            "{PRIVATE_KEY_ENV} not set; falling back to the publicly known development key"
        );
    }
    let oracle = AgeOracle::new(oracle_key);

    // Bootstrap: local chain, deployer account, fresh contract keypair,
    // one deployment transaction initialized with the oracle's key.
    let mut chain = LocalChain::new();
    let deployer = chain
        .test_account(0)
        .context("local chain has no test accounts")?;
    let contract_key = PrivateKey::random();
    let contract = chain
        .deploy_age_verifier(&deployer, &contract_key, oracle.public_key())
        .context("verifier contract deployment failed")?;
    log::info!("verifier contract deployed at {contract}");

    let state = Arc::new(AppState {
        oracle,
        chain: RwLock::new(chain),
        deployer,
        contract,
    });

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("failed to bind to {}", cfg.listen))?;
    log::info!("server running on {}", cfg.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

/// EVM Mock Node
///
/// Serves Ethereum JSON-RPC from an in-memory chain for local runs of the
/// contract exercise without Ganache or Anvil.
use anyhow::{Context, Result};
use std::env;
use std::sync::{Arc, Mutex};

use evm_mock::chain::{MockChain, DEFAULT_ACCOUNT_COUNT};
use evm_mock::run_server;

#[derive(Debug)]
struct Config {
    // Chain
    account_count: u8,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let account_count = env::var("MOCK_ACCOUNTS")
            .unwrap_or_else(|_| DEFAULT_ACCOUNT_COUNT.to_string())
            .parse()
            .context("Invalid MOCK_ACCOUNTS")?;

        let server_host = env::var("MOCK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("MOCK_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("Invalid MOCK_PORT")?;

        Ok(Self {
            account_count,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting EVM mock node...");

    let config = Config::from_env().context("Failed to load configuration")?;

    let chain = MockChain::new(config.account_count).context("Failed to create mock chain")?;
    for account in chain.accounts() {
        log::info!("   Account {}", account);
    }

    run_server(
        Arc::new(Mutex::new(chain)),
        config.server_host,
        config.server_port,
    )
    .await
    .context("Server error")?;

    Ok(())
}

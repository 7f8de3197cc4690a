/// Run configuration from environment variables
///
/// Controls which node to talk to, which contract to deploy and how long to
/// wait for transactions to be mined. Defaults target a local Ganache/Anvil
/// node on port 8545.
use alloy_primitives::utils::parse_ether;
use alloy_primitives::U256;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SoltestError;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 100;
pub const DEFAULT_TRANSFER_ETHER: &str = "1";

/// Where the contract interface description and bytecode come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Compiled artifact JSON (Truffle, Hardhat or Foundry layout)
    File(PathBuf),
    /// Built-in authorized-wallet ABI with hex bytecode
    Bytecode(String),
}

/// How long to wait for a receipt and how often to ask
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReceiptWait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_MS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SoltestConfig {
    /// Node JSON-RPC endpoint
    pub rpc_url: String,
    /// Contract to deploy, `None` until configured
    pub artifact: Option<ArtifactSource>,
    /// Receipt polling behaviour
    pub receipt_wait: ReceiptWait,
    /// Ether amount (decimal string) moved by the transfer step
    pub transfer_ether: String,
}

impl SoltestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SOLTEST_RPC_URL`: node endpoint (default `http://127.0.0.1:8545`)
    /// - `SOLTEST_ARTIFACT`: path to a compiled artifact JSON
    /// - `SOLTEST_BYTECODE`: hex bytecode for the built-in ABI
    /// - `SOLTEST_RECEIPT_TIMEOUT_SECS`: receipt deadline (default 120)
    /// - `SOLTEST_RECEIPT_POLL_MS`: receipt poll interval (default 100)
    /// - `SOLTEST_TRANSFER_ETHER`: ether sent by the transfer step (default 1)
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Examples
    ///
    /// ```bash
    /// SOLTEST_ARTIFACT=build/contracts/AuthorizedWallet.json cargo run
    /// ```
    pub fn from_env() -> Result<Self, SoltestError> {
        dotenv::dotenv().ok();

        let rpc_url = env::var("SOLTEST_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        log::info!("📡 RPC URL: {}", rpc_url);

        let artifact = match (env::var("SOLTEST_ARTIFACT"), env::var("SOLTEST_BYTECODE")) {
            (Ok(path), _) if !path.trim().is_empty() => {
                log::info!("📦 Contract artifact: {}", path);
                Some(ArtifactSource::File(PathBuf::from(path)))
            }
            (_, Ok(code)) if !code.trim().is_empty() => {
                log::info!("📦 Using built-in ABI with bytecode from SOLTEST_BYTECODE");
                Some(ArtifactSource::Bytecode(code.trim().to_string()))
            }
            _ => None,
        };

        let timeout_secs = parse_var("SOLTEST_RECEIPT_TIMEOUT_SECS", DEFAULT_RECEIPT_TIMEOUT_SECS)?;
        let poll_ms = parse_var("SOLTEST_RECEIPT_POLL_MS", DEFAULT_RECEIPT_POLL_MS)?;
        if poll_ms == 0 {
            return Err(SoltestError::Config(
                "SOLTEST_RECEIPT_POLL_MS must be greater than zero".to_string(),
            ));
        }

        let transfer_ether = env::var("SOLTEST_TRANSFER_ETHER")
            .unwrap_or_else(|_| DEFAULT_TRANSFER_ETHER.to_string());

        let config = Self {
            rpc_url,
            artifact,
            receipt_wait: ReceiptWait {
                timeout: Duration::from_secs(timeout_secs),
                poll_interval: Duration::from_millis(poll_ms),
            },
            transfer_ether,
        };
        config.transfer_amount()?;
        Ok(config)
    }

    /// Transfer amount in wei
    pub fn transfer_amount(&self) -> Result<U256, SoltestError> {
        parse_ether(self.transfer_ether.trim()).map_err(|e| {
            SoltestError::Config(format!(
                "Invalid SOLTEST_TRANSFER_ETHER {}: {}",
                self.transfer_ether, e
            ))
        })
    }

    /// Configuration for a given endpoint with everything else defaulted
    pub fn with_rpc_url(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }
}

impl Default for SoltestConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            artifact: None,
            receipt_wait: ReceiptWait::default(),
            transfer_ether: DEFAULT_TRANSFER_ETHER.to_string(),
        }
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64, SoltestError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SoltestError::Config(format!("Invalid {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_local_node() {
        let config = SoltestConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert!(config.artifact.is_none());
        assert_eq!(config.transfer_ether, "1");
    }

    #[test]
    fn test_default_receipt_wait() {
        let wait = ReceiptWait::default();
        assert_eq!(wait.timeout, Duration::from_secs(120));
        assert_eq!(wait.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_with_rpc_url() {
        let config = SoltestConfig::with_rpc_url("http://localhost:7545");
        assert_eq!(config.rpc_url, "http://localhost:7545");
        assert_eq!(config.receipt_wait, ReceiptWait::default());
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("SOLTEST_TEST_PARSE_VAR", "soon");
        let result = parse_var("SOLTEST_TEST_PARSE_VAR", 5);
        env::remove_var("SOLTEST_TEST_PARSE_VAR");
        assert!(matches!(result, Err(SoltestError::Config(_))));
    }

    #[test]
    fn test_transfer_amount() {
        let config = SoltestConfig {
            transfer_ether: "0.5".to_string(),
            ..SoltestConfig::default()
        };
        assert_eq!(
            config.transfer_amount().unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );

        let config = SoltestConfig {
            transfer_ether: "lots".to_string(),
            ..SoltestConfig::default()
        };
        assert!(matches!(config.transfer_amount(), Err(SoltestError::Config(_))));
    }

    #[test]
    fn test_from_env_rejects_bad_transfer_amount() {
        env::set_var("SOLTEST_TRANSFER_ETHER", "lots");
        let result = SoltestConfig::from_env();
        env::remove_var("SOLTEST_TRANSFER_ETHER");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("SOLTEST_TRANSFER_ETHER"));
    }

    #[test]
    fn test_parse_var_default_when_unset() {
        assert_eq!(parse_var("SOLTEST_TEST_UNSET_VAR", 42).unwrap(), 42);
    }
}

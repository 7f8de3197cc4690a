//! Shared setup for the integration tests
//!
//! Starts an in-process `evm-mock` node and provides fast receipt polling
//! so tests don't sit on the 120s production deadline.

#![allow(dead_code)]

use evm_mock::MockNode;
use soltest::scenario::{self, Connection};
use soltest::{ContractArtifact, EthRpcClient, ReceiptWait, SoltestConfig};
use std::time::Duration;

pub const WALLET_BYTECODE: &str = "0x6080604052348015600f57600080fd5b50";

/// Initialize test logging (only once, subsequent calls are no-ops)
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn fast_wait() -> ReceiptWait {
    ReceiptWait {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

pub struct TestNode {
    pub node: MockNode,
    pub client: EthRpcClient,
}

impl TestNode {
    pub async fn start() -> anyhow::Result<Self> {
        Self::with_accounts(10).await
    }

    pub async fn with_accounts(count: u8) -> anyhow::Result<Self> {
        init_logging();
        let node = MockNode::start(count).await?;
        let client = EthRpcClient::new(node.url());
        log::info!("🧪 Mock node at {}", node.url());
        Ok(Self { node, client })
    }

    pub async fn connect(&self) -> Connection {
        scenario::connect(&self.node.url())
            .await
            .expect("Mock node not reachable")
    }

    pub fn config(&self) -> SoltestConfig {
        SoltestConfig {
            receipt_wait: fast_wait(),
            ..SoltestConfig::with_rpc_url(self.node.url())
        }
    }
}

pub fn wallet_artifact() -> ContractArtifact {
    ContractArtifact::authorized_wallet(WALLET_BYTECODE).expect("built-in artifact")
}

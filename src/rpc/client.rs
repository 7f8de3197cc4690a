use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::ReceiptWait;
use crate::error::SoltestError;
use crate::rpc::types::{JsonRpcRequest, JsonRpcResponse, TransactionReceipt, TransactionRequest};

/// JSON-RPC client for an Ethereum-compatible node
///
/// Cheap to clone: the HTTP client and the request id counter are shared.
#[derive(Clone, Debug)]
pub struct EthRpcClient {
    http_client: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl EthRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one JSON-RPC request and decode its `result`
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, SoltestError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("→ {} (id {}) {}", method, id, params);

        let response = self
            .http_client
            .post(&self.url)
            .json(&JsonRpcRequest::new(id, method, params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Some nodes put JSON-RPC errors in non-2xx bodies, so parse first
        let parsed: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            SoltestError::InvalidResponse(format!(
                "{} returned HTTP {} with unreadable body: {}",
                method, status, e
            ))
        })?;

        if let Some(error) = parsed.error {
            log::debug!("← {} (id {}) error {}: {}", method, id, error.code, error.message);
            return Err(SoltestError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        let result = parsed.result.unwrap_or(Value::Null);
        log::debug!("← {} (id {}) {}", method, id, result);

        serde_json::from_value(result).map_err(|e| {
            SoltestError::InvalidResponse(format!("Unexpected {} result: {}", method, e))
        })
    }

    /// Check whether the node answers at all
    ///
    /// Transport and RPC failures are reported as `false`, not as errors.
    pub async fn is_connected(&self) -> bool {
        match self.client_version().await {
            Ok(version) => {
                log::debug!("Node client version: {}", version);
                true
            }
            Err(e) => {
                log::warn!("Node at {} not reachable: {}", self.url, e);
                false
            }
        }
    }

    pub async fn client_version(&self) -> Result<String, SoltestError> {
        self.request("web3_clientVersion", json!([])).await
    }

    pub async fn chain_id(&self) -> Result<u64, SoltestError> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to())
    }

    pub async fn block_number(&self) -> Result<u64, SoltestError> {
        let number: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to())
    }

    /// Accounts managed (and unlocked) by the node
    pub async fn accounts(&self) -> Result<Vec<Address>, SoltestError> {
        self.request("eth_accounts", json!([])).await
    }

    /// Balance in wei at the latest block
    pub async fn get_balance(&self, address: Address) -> Result<U256, SoltestError> {
        self.request("eth_getBalance", json!([address, "latest"])).await
    }

    /// Execute a read-only call at the latest block and return the raw output
    pub async fn call(&self, request: &TransactionRequest) -> Result<Bytes, SoltestError> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    /// Submit a transaction for the node to sign with the `from` account
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, SoltestError> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    /// Receipt for a mined transaction, `None` while still pending
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, SoltestError> {
        self.request("eth_getTransactionReceipt", json!([tx_hash])).await
    }

    /// Poll until the transaction is mined
    ///
    /// Returns the receipt as-is; callers decide what a failed status means.
    pub async fn wait_for_transaction_receipt(
        &self,
        tx_hash: B256,
        wait: ReceiptWait,
    ) -> Result<TransactionReceipt, SoltestError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                log::debug!("   Receipt for {} after {} attempt(s)", tx_hash, attempts);
                return Ok(receipt);
            }

            if started.elapsed() >= wait.timeout {
                return Err(SoltestError::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                    waited_secs: wait.timeout.as_secs(),
                });
            }

            tokio::time::sleep(wait.poll_interval).await;
        }
    }
}

/// Axum HTTP handlers for the JSON-RPC endpoint and mock controls
use alloy_primitives::{Address, B256, U64};
use axum::{extract::State, Json};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chain::{MockChain, CHAIN_ID, CLIENT_VERSION};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<Mutex<MockChain>>;

fn lock(state: &AppState) -> MutexGuard<'_, MockChain> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// POST /
/// Dispatches a single JSON-RPC request
pub async fn json_rpc(
    State(state): State<AppState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    log::debug!("{} {}", req.method, req.params);

    let id = req.id.clone();
    let response = match dispatch(&state, &req) {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => {
            log::debug!("{} failed: {}", req.method, error);
            RpcResponse::error(id, error)
        }
    };
    Json(response)
}

fn dispatch(state: &AppState, req: &RpcRequest) -> Result<Value, RpcError> {
    match req.method.as_str() {
        "web3_clientVersion" => Ok(json!(CLIENT_VERSION)),
        "net_version" => Ok(json!(CHAIN_ID.to_string())),
        "eth_chainId" => Ok(json!(U64::from(CHAIN_ID))),
        "eth_blockNumber" => Ok(json!(U64::from(lock(state).block_number()))),
        "eth_accounts" => Ok(json!(lock(state).accounts())),
        "eth_getBalance" => {
            let address: Address = param(&req.params, 0)?;
            Ok(json!(lock(state).balance(address)))
        }
        "eth_call" => {
            let tx: CallParams = param(&req.params, 0)?;
            let output = lock(state).call(&tx)?;
            Ok(json!(output))
        }
        "eth_sendTransaction" => {
            let tx: CallParams = param(&req.params, 0)?;
            let tx_hash = lock(state).send_transaction(&tx)?;
            Ok(json!(tx_hash))
        }
        "eth_getTransactionReceipt" => {
            let hash: B256 = param(&req.params, 0)?;
            Ok(lock(state).receipt(hash))
        }
        other => Err(RpcError::method_not_found(other)),
    }
}

fn param<T: DeserializeOwned>(params: &Value, index: usize) -> Result<T, RpcError> {
    let raw = params
        .get(index)
        .cloned()
        .ok_or_else(|| RpcError::invalid_params(format!("missing parameter {}", index)))?;
    serde_json::from_value(raw)
        .map_err(|e| RpcError::invalid_params(format!("parameter {}: {}", index, e)))
}

/// POST /mock/revert-next
/// Make the next transaction(s) revert (helper endpoint for testing)
pub async fn revert_next(
    State(state): State<AppState>,
    Json(req): Json<RevertRequest>,
) -> Json<MockStatusResponse> {
    log::info!("Next {} transaction(s) will revert", req.count);
    let mut chain = lock(&state);
    chain.revert_next(req.count);
    Json(status_of(&chain))
}

/// GET /mock/status
pub async fn mock_status(State(state): State<AppState>) -> Json<MockStatusResponse> {
    Json(status_of(&lock(&state)))
}

fn status_of(chain: &MockChain) -> MockStatusResponse {
    MockStatusResponse {
        block_number: chain.block_number(),
        accounts: chain.accounts().to_vec(),
        contracts: chain.contracts(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

//! EthRpcClient Integration Tests
//!
//! Exercises the JSON-RPC client against an in-process mock node:
//! connectivity, account/balance queries, error mapping and receipt polling.
//!
//! Run with: cargo test --test rpc_client_test -- --nocapture

mod common;

use common::{fast_wait, TestNode};
use serde_json::{json, Value};
use soltest::{Address, EthRpcClient, ReceiptWait, SoltestError, TransactionRequest, U256};
use std::time::Duration;

#[tokio::test]
async fn test_is_connected() {
    let node = TestNode::start().await.unwrap();
    assert!(node.client.is_connected().await);

    let version = node.client.client_version().await.unwrap();
    assert!(version.starts_with("evm-mock"));
    assert_eq!(node.client.chain_id().await.unwrap(), 1337);
}

#[tokio::test]
async fn test_not_connected_is_false_not_error() {
    common::init_logging();
    let client = EthRpcClient::new("http://127.0.0.1:9");
    assert!(!client.is_connected().await);

    let err = client.accounts().await.unwrap_err();
    assert!(matches!(err, SoltestError::ConnectionFailed(_)));
}

#[tokio::test]
async fn test_accounts_and_balances() {
    let node = TestNode::with_accounts(4).await.unwrap();

    let accounts = node.client.accounts().await.unwrap();
    assert_eq!(accounts.len(), 4);
    assert_eq!(accounts[0], Address::with_last_byte(1));

    let balance = node.client.get_balance(accounts[0]).await.unwrap();
    assert_eq!(balance, evm_mock::chain::initial_balance());

    let stranger = node.client.get_balance(Address::repeat_byte(0x77)).await.unwrap();
    assert_eq!(stranger, U256::ZERO);
}

#[tokio::test]
async fn test_unknown_method_maps_to_rpc_error() {
    let node = TestNode::start().await.unwrap();

    let err = node
        .client
        .request::<Value>("eth_mineGold", json!([]))
        .await
        .unwrap_err();

    match err {
        SoltestError::Rpc { method, code, .. } => {
            assert_eq!(method, "eth_mineGold");
            assert_eq!(code, -32601);
        }
        other => panic!("expected Rpc error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_value_transfer_and_receipt() {
    let node = TestNode::start().await.unwrap();
    let accounts = node.client.accounts().await.unwrap();
    let amount = U256::from(12_345u64);

    let request = TransactionRequest::new()
        .from(accounts[0])
        .to(accounts[1])
        .value(amount);
    let tx_hash = node.client.send_transaction(&request).await.unwrap();

    let receipt = node
        .client
        .wait_for_transaction_receipt(tx_hash, fast_wait())
        .await
        .unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);
    assert!(receipt.succeeded());
    assert!(receipt.contract_address.is_none());

    let balance = node.client.get_balance(accounts[1]).await.unwrap();
    assert_eq!(balance, evm_mock::chain::initial_balance() + amount);
    assert_eq!(node.client.block_number().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_sender_is_rejected_by_node() {
    let node = TestNode::start().await.unwrap();
    let request = TransactionRequest::new()
        .from(Address::repeat_byte(0xee))
        .to(Address::with_last_byte(1));

    let err = node.client.send_transaction(&request).await.unwrap_err();
    assert!(matches!(err, SoltestError::Rpc { code: -32000, .. }));
}

#[tokio::test]
async fn test_wait_polls_until_mined() {
    let node = TestNode::start().await.unwrap();
    node.node.with_chain(|chain| chain.set_receipt_delay(3));
    let accounts = node.client.accounts().await.unwrap();

    let request = TransactionRequest::new().from(accounts[0]).to(accounts[2]);
    let tx_hash = node.client.send_transaction(&request).await.unwrap();

    assert!(node
        .client
        .get_transaction_receipt(tx_hash)
        .await
        .unwrap()
        .is_none());

    let receipt = node
        .client
        .wait_for_transaction_receipt(tx_hash, fast_wait())
        .await
        .unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);
}

#[tokio::test]
async fn test_wait_times_out() {
    let node = TestNode::start().await.unwrap();
    node.node.with_chain(|chain| chain.set_receipt_delay(u32::MAX));
    let accounts = node.client.accounts().await.unwrap();

    let request = TransactionRequest::new().from(accounts[0]).to(accounts[1]);
    let tx_hash = node.client.send_transaction(&request).await.unwrap();

    let wait = ReceiptWait {
        timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(20),
    };
    let err = node
        .client
        .wait_for_transaction_receipt(tx_hash, wait)
        .await
        .unwrap_err();
    assert!(matches!(err, SoltestError::ReceiptTimeout { .. }));
}

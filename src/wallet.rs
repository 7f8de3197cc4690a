//! Typed binding for the authorized-wallet contract
//!
//! Wraps [`Contract`] so callers deal in `Address`/`U256` instead of
//! `DynSolValue`. The contract keeps an owner, a list of authorized
//! addresses and an ether balance that the owner can send out.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, U256};

use crate::contract::{Contract, TxOptions};
use crate::error::SoltestError;
use crate::rpc::TransactionReceipt;

#[derive(Debug, Clone)]
pub struct AuthorizedWallet {
    contract: Contract,
}

impl AuthorizedWallet {
    pub fn new(contract: Contract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub async fn owner(&self) -> Result<Address, SoltestError> {
        let output = self.contract.call("owner", &[]).await?;
        expect_address(&output, "owner")
    }

    /// Contract balance in wei
    pub async fn check_funds(&self) -> Result<U256, SoltestError> {
        let output = self.contract.call("checkFunds", &[]).await?;
        expect_uint(&output, "checkFunds")
    }

    /// Replay counter consumed by signed transfers
    pub async fn nonce(&self) -> Result<U256, SoltestError> {
        let output = self.contract.call("nonce", &[]).await?;
        expect_uint(&output, "nonce")
    }

    pub async fn authorized_addresses(&self) -> Result<Vec<Address>, SoltestError> {
        let output = self.contract.call("getAuthorizedAddresses", &[]).await?;
        let items = output
            .first()
            .and_then(DynSolValue::as_array)
            .ok_or_else(|| decode_error("getAuthorizedAddresses", "address[]"))?;

        items
            .iter()
            .map(|item| {
                item.as_address()
                    .ok_or_else(|| decode_error("getAuthorizedAddresses", "address[]"))
            })
            .collect()
    }

    pub async fn add_address(&self, address: Address) -> Result<TransactionReceipt, SoltestError> {
        self.contract
            .transact(
                "addAddress",
                &[DynSolValue::Address(address)],
                TxOptions::default(),
            )
            .await
    }

    pub async fn remove_address(
        &self,
        address: Address,
    ) -> Result<TransactionReceipt, SoltestError> {
        self.contract
            .transact(
                "removeAddress",
                &[DynSolValue::Address(address)],
                TxOptions::default(),
            )
            .await
    }

    /// Send `amount` wei from the contract to `to`, attaching `value` wei
    pub async fn send_funds(
        &self,
        to: Address,
        amount: U256,
        value: U256,
    ) -> Result<TransactionReceipt, SoltestError> {
        self.contract
            .transact(
                "sendFunds",
                &[DynSolValue::Address(to), DynSolValue::Uint(amount, 256)],
                TxOptions::default().with_value(value),
            )
            .await
    }

    /// Transfer authorized by an owner signature over the contract's message
    pub async fn send_funds_with_signature(
        &self,
        to: Address,
        amount: U256,
        nonce: U256,
        signature: Bytes,
    ) -> Result<TransactionReceipt, SoltestError> {
        self.contract
            .transact(
                "sendFundsWithSignature",
                &[
                    DynSolValue::Address(to),
                    DynSolValue::Uint(amount, 256),
                    DynSolValue::Uint(nonce, 256),
                    DynSolValue::Bytes(signature.to_vec()),
                ],
                TxOptions::default(),
            )
            .await
    }
}

fn expect_address(output: &[DynSolValue], method: &str) -> Result<Address, SoltestError> {
    output
        .first()
        .and_then(DynSolValue::as_address)
        .ok_or_else(|| decode_error(method, "address"))
}

fn expect_uint(output: &[DynSolValue], method: &str) -> Result<U256, SoltestError> {
    output
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(value, _bits)| value)
        .ok_or_else(|| decode_error(method, "uint256"))
}

fn decode_error(method: &str, expected: &str) -> SoltestError {
    SoltestError::AbiEncoding(format!("{}() did not return {}", method, expected))
}

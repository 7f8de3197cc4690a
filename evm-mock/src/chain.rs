/// In-memory chain backing the mock node
///
/// Simulates funded, unlocked accounts plus any number of deployed
/// authorized-wallet contracts. Each transaction is mined into its own
/// block immediately; receipts can be held back to exercise polling.
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{hex, keccak256, Address, Bytes, B256, U256, U64};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::types::{CallParams, RpcError};

pub const CHAIN_ID: u64 = 1337;
pub const CLIENT_VERSION: &str = "evm-mock/v0.1.0";
pub const DEFAULT_ACCOUNT_COUNT: u8 = 10;
const GAS_USED: u64 = 21_000;

const WALLET_ABI: &str = include_str!("../../src/abi/authorized_wallet.json");

/// 100 ether in wei
pub fn initial_balance() -> U256 {
    U256::from(100u64) * U256::from(1_000_000_000_000_000_000u128)
}

#[derive(Debug, Clone)]
struct WalletContract {
    owner: Address,
    authorized: Vec<Address>,
    balance: U256,
    nonce: U256,
}

pub struct MockChain {
    abi: JsonAbi,
    accounts: Vec<Address>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    contracts: HashMap<Address, WalletContract>,
    receipts: HashMap<B256, Value>,
    block_number: u64,
    revert_next: u32,
    receipt_delay: u32,
    pending_polls: HashMap<B256, u32>,
}

impl MockChain {
    pub fn new(account_count: u8) -> anyhow::Result<Self> {
        let abi: JsonAbi = serde_json::from_str(WALLET_ABI)?;
        let accounts: Vec<Address> = (1..=account_count).map(Address::with_last_byte).collect();
        let balances = accounts.iter().map(|a| (*a, initial_balance())).collect();

        Ok(Self {
            abi,
            accounts,
            balances,
            nonces: HashMap::new(),
            contracts: HashMap::new(),
            receipts: HashMap::new(),
            block_number: 0,
            revert_next: 0,
            receipt_delay: 0,
            pending_polls: HashMap::new(),
        })
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn contracts(&self) -> Vec<Address> {
        self.contracts.keys().copied().collect()
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn balance(&self, address: Address) -> U256 {
        if let Some(contract) = self.contracts.get(&address) {
            return contract.balance;
        }
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Make the next `count` transactions revert
    pub fn revert_next(&mut self, count: u32) {
        self.revert_next += count;
    }

    /// Report `null` for this many receipt polls of every new transaction
    pub fn set_receipt_delay(&mut self, polls: u32) {
        self.receipt_delay = polls;
    }

    pub fn receipt(&mut self, tx_hash: B256) -> Value {
        if let Some(remaining) = self.pending_polls.get_mut(&tx_hash) {
            if *remaining > 0 {
                *remaining -= 1;
                return Value::Null;
            }
        }
        self.receipts.get(&tx_hash).cloned().unwrap_or(Value::Null)
    }

    /// Mine a transaction sent by an unlocked account
    pub fn send_transaction(&mut self, tx: &CallParams) -> Result<B256, RpcError> {
        let from = tx
            .from
            .ok_or_else(|| RpcError::invalid_params("from not specified"))?;
        if !self.accounts.contains(&from) {
            return Err(RpcError::server("sender account not recognized"));
        }

        let value = tx.value();
        let sender_balance = self.balance(from);
        if value > sender_balance {
            return Err(RpcError::server("insufficient funds for gas * price + value"));
        }

        let nonce = self.nonces.get(&from).copied().unwrap_or_default();
        self.nonces.insert(from, nonce + 1);
        self.block_number += 1;

        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let tx_hash = keccak256(&preimage);

        let outcome = if self.revert_next > 0 {
            self.revert_next -= 1;
            Err("forced revert".to_string())
        } else {
            // Debit first so a transfer to self nets out
            self.balances.insert(from, sender_balance - value);
            let result = match tx.to {
                None => self.create(from, nonce, tx.input(), value),
                Some(to) => self.execute(from, to, tx.input(), value),
            };
            if result.is_err() {
                self.balances.insert(from, sender_balance);
            }
            result
        };

        let (status, contract_address) = match outcome {
            Ok(created) => (U64::from(1), created),
            Err(reason) => {
                log::info!("Transaction {} reverted: {}", tx_hash, reason);
                (U64::ZERO, None)
            }
        };

        let receipt = json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": keccak256(self.block_number.to_be_bytes()),
            "blockNumber": U64::from(self.block_number),
            "from": from,
            "to": tx.to,
            "gasUsed": U64::from(GAS_USED),
            "cumulativeGasUsed": U64::from(GAS_USED),
            "contractAddress": contract_address,
            "logs": [],
            "status": status,
        });
        self.receipts.insert(tx_hash, receipt);
        if self.receipt_delay > 0 {
            self.pending_polls.insert(tx_hash, self.receipt_delay);
        }

        Ok(tx_hash)
    }

    /// Read-only execution; unknown targets return empty data like real nodes
    pub fn call(&self, tx: &CallParams) -> Result<Bytes, RpcError> {
        let Some(contract) = tx.to.and_then(|to| self.contracts.get(&to)) else {
            return Ok(Bytes::new());
        };

        let (function, _args) = self
            .decode(tx.input())
            .map_err(|reason| RpcError::server(format!("execution reverted: {}", reason)))?;

        let output = match function.name.as_str() {
            "owner" => DynSolValue::Address(contract.owner),
            "checkFunds" => DynSolValue::Uint(contract.balance, 256),
            "nonce" => DynSolValue::Uint(contract.nonce, 256),
            "getAuthorizedAddresses" => DynSolValue::Array(
                contract
                    .authorized
                    .iter()
                    .copied()
                    .map(DynSolValue::Address)
                    .collect(),
            ),
            _ => return Ok(Bytes::new()),
        };

        function
            .abi_encode_output(&[output])
            .map(Bytes::from)
            .map_err(|e| RpcError::server(e.to_string()))
    }

    fn create(
        &mut self,
        from: Address,
        nonce: u64,
        init_code: &[u8],
        value: U256,
    ) -> Result<Option<Address>, String> {
        if init_code.is_empty() {
            return Err("empty init code".to_string());
        }
        let payable = self
            .abi
            .constructor()
            .map_or(false, |c| c.state_mutability == StateMutability::Payable);
        if !value.is_zero() && !payable {
            return Err("constructor is not payable".to_string());
        }

        let address = from.create(nonce);
        self.contracts.insert(
            address,
            WalletContract {
                owner: from,
                authorized: Vec::new(),
                balance: value,
                nonce: U256::ZERO,
            },
        );
        log::info!("Deployed wallet contract at {}", address);
        Ok(Some(address))
    }

    fn execute(
        &mut self,
        from: Address,
        to: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Option<Address>, String> {
        let Some(current) = self.contracts.get(&to) else {
            // Plain ether transfer between accounts
            *self.balances.entry(to).or_default() += value;
            return Ok(None);
        };

        let (function, args) = self.decode(input)?;
        if !value.is_zero() && function.state_mutability != StateMutability::Payable {
            return Err(format!("{} is not payable", function.name));
        }
        let mut next = current.clone();
        next.balance += value;
        let mut payout = None;

        match function.name.as_str() {
            "addAddress" | "removeAddress" | "sendFunds" if from != next.owner => {
                return Err("caller is not the owner".to_string());
            }
            "addAddress" => {
                let address = arg_address(&args, 0)?;
                if !next.authorized.contains(&address) {
                    next.authorized.push(address);
                }
            }
            "removeAddress" => {
                let address = arg_address(&args, 0)?;
                next.authorized.retain(|a| *a != address);
            }
            "sendFunds" => {
                let recipient = arg_address(&args, 0)?;
                let amount = arg_uint(&args, 1)?;
                if amount > next.balance {
                    return Err("insufficient contract balance".to_string());
                }
                next.balance -= amount;
                payout = Some((recipient, amount));
            }
            "sendFundsWithSignature" => {
                return Err("signature verification is not simulated".to_string());
            }
            other => return Err(format!("{} is not a transaction", other)),
        }

        self.contracts.insert(to, next);
        if let Some((recipient, amount)) = payout {
            *self.balances.entry(recipient).or_default() += amount;
        }
        Ok(None)
    }

    fn decode(&self, input: &[u8]) -> Result<(&Function, Vec<DynSolValue>), String> {
        let selector = input
            .get(..4)
            .ok_or_else(|| "calldata shorter than a selector".to_string())?;
        let function = self
            .abi
            .functions()
            .find(|f| f.selector().as_slice() == selector)
            .ok_or_else(|| format!("unknown selector 0x{}", hex::encode(selector)))?;
        let args = function
            .abi_decode_input(&input[4..])
            .map_err(|e| e.to_string())?;
        Ok((function, args))
    }
}

fn arg_address(args: &[DynSolValue], index: usize) -> Result<Address, String> {
    args.get(index)
        .and_then(DynSolValue::as_address)
        .ok_or_else(|| format!("argument {} is not an address", index))
}

fn arg_uint(args: &[DynSolValue], index: usize) -> Result<U256, String> {
    args.get(index)
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| format!("argument {} is not a uint", index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> MockChain {
        MockChain::new(3).unwrap()
    }

    fn deploy(chain: &mut MockChain, from: Address) -> Address {
        let tx = CallParams {
            from: Some(from),
            data: Some(Bytes::from(vec![0x60, 0x80])),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();
        let receipt = chain.receipt(hash);
        serde_json::from_value(receipt["contractAddress"].clone()).unwrap()
    }

    fn calldata(chain: &MockChain, name: &str, args: &[DynSolValue]) -> Bytes {
        let function = &chain.abi.function(name).unwrap()[0];
        Bytes::from(function.abi_encode_input(args).unwrap())
    }

    #[test]
    fn test_deploy_uses_create_address() {
        let mut chain = chain();
        let deployer = chain.accounts()[0];
        let address = deploy(&mut chain, deployer);
        assert_eq!(address, deployer.create(0));
        assert_eq!(chain.block_number(), 1);
    }

    #[test]
    fn test_non_owner_cannot_authorize() {
        let mut chain = chain();
        let owner = chain.accounts()[0];
        let other = chain.accounts()[1];
        let contract = deploy(&mut chain, owner);

        let tx = CallParams {
            from: Some(other),
            to: Some(contract),
            data: Some(calldata(&chain, "addAddress", &[DynSolValue::Address(other)])),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();
        assert_eq!(chain.receipt(hash)["status"], json!("0x0"));
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let mut chain = chain();
        let tx = CallParams {
            from: Some(Address::repeat_byte(0xee)),
            ..Default::default()
        };
        let err = chain.send_transaction(&tx).unwrap_err();
        assert_eq!(err.code, -32000);
    }

    #[test]
    fn test_receipt_delay() {
        let mut chain = chain();
        chain.set_receipt_delay(2);
        let from = chain.accounts()[0];
        let to = chain.accounts()[1];
        let tx = CallParams {
            from: Some(from),
            to: Some(to),
            value: Some(U256::from(5u64)),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();

        assert!(chain.receipt(hash).is_null());
        assert!(chain.receipt(hash).is_null());
        assert!(!chain.receipt(hash).is_null());
        assert_eq!(chain.balance(to), initial_balance() + U256::from(5u64));
    }

    #[test]
    fn test_transfer_to_self_keeps_balance() {
        let mut chain = chain();
        let from = chain.accounts()[0];
        let tx = CallParams {
            from: Some(from),
            to: Some(from),
            value: Some(U256::from(5u64)),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();
        assert_eq!(chain.receipt(hash)["status"], json!("0x1"));
        assert_eq!(chain.balance(from), initial_balance());
    }

    #[test]
    fn test_payable_constructor_funds_contract() {
        let mut chain = chain();
        let owner = chain.accounts()[0];
        let tx = CallParams {
            from: Some(owner),
            data: Some(Bytes::from(vec![0x60, 0x80])),
            value: Some(U256::from(1_000u64)),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();
        assert_eq!(chain.receipt(hash)["status"], json!("0x1"));
        assert_eq!(chain.balance(owner.create(0)), U256::from(1_000u64));
        assert_eq!(chain.balance(owner), initial_balance() - U256::from(1_000u64));
    }

    #[test]
    fn test_value_to_nonpayable_function_reverts() {
        let mut chain = chain();
        let owner = chain.accounts()[0];
        let recipient = chain.accounts()[2];
        let contract = deploy(&mut chain, owner);

        let tx = CallParams {
            from: Some(owner),
            to: Some(contract),
            data: Some(calldata(
                &chain,
                "sendFunds",
                &[
                    DynSolValue::Address(recipient),
                    DynSolValue::Uint(U256::from(1u64), 256),
                ],
            )),
            value: Some(U256::from(5u64)),
            ..Default::default()
        };
        let hash = chain.send_transaction(&tx).unwrap();

        assert_eq!(chain.receipt(hash)["status"], json!("0x0"));
        assert_eq!(chain.balance(contract), U256::ZERO);
        assert_eq!(chain.balance(owner), initial_balance());
        assert_eq!(chain.balance(recipient), initial_balance());
    }

    #[test]
    fn test_call_unknown_address_returns_empty() {
        let chain = chain();
        let tx = CallParams {
            to: Some(Address::repeat_byte(0x99)),
            ..Default::default()
        };
        assert!(chain.call(&tx).unwrap().is_empty());
    }
}

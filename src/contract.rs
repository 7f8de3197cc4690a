//! Generic contract handle
//!
//! Binds an ABI to a deployed address and turns method names plus
//! `DynSolValue` arguments into `eth_call` / `eth_sendTransaction` requests.
//! Every transaction blocks until its receipt is observed.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{Address, Bytes, U256};

use crate::artifact::ContractArtifact;
use crate::config::ReceiptWait;
use crate::error::SoltestError;
use crate::rpc::{EthRpcClient, TransactionReceipt, TransactionRequest};

/// Per-transaction overrides
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    /// Sender; falls back to the contract's default account
    pub from: Option<Address>,
    /// Wei attached to the transaction
    pub value: U256,
    /// Gas limit; estimated by the node when unset
    pub gas: Option<U256>,
}

impl TxOptions {
    pub fn sender(account: Address) -> Self {
        Self {
            from: Some(account),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Contract {
    client: EthRpcClient,
    address: Address,
    abi: JsonAbi,
    default_account: Option<Address>,
    receipt_wait: ReceiptWait,
}

impl Contract {
    /// Handle for a contract already on chain
    pub fn at(client: EthRpcClient, address: Address, abi: JsonAbi) -> Self {
        Self {
            client,
            address,
            abi,
            default_account: None,
            receipt_wait: ReceiptWait::default(),
        }
    }

    /// Deploy the artifact and wait for the creation receipt
    ///
    /// The receipt must carry a contract address and a success status.
    /// The returned handle uses `options.from` as its default account.
    pub async fn deploy(
        client: &EthRpcClient,
        artifact: &ContractArtifact,
        constructor_args: &[DynSolValue],
        options: TxOptions,
        receipt_wait: ReceiptWait,
    ) -> Result<(Self, TransactionReceipt), SoltestError> {
        // A contract without an explicit constructor cannot take ether either
        let mutability = artifact
            .abi
            .constructor()
            .map_or(StateMutability::NonPayable, |c| c.state_mutability);
        ensure_payable(mutability, options.value, "constructor")?;

        let mut data = artifact.bytecode.to_vec();
        match artifact.abi.constructor() {
            Some(constructor) => {
                let encoded = constructor
                    .abi_encode_input(constructor_args)
                    .map_err(SoltestError::abi)?;
                data.extend_from_slice(&encoded);
            }
            None if !constructor_args.is_empty() => {
                return Err(SoltestError::AbiEncoding(format!(
                    "Contract has no constructor but {} argument(s) given",
                    constructor_args.len()
                )));
            }
            None => {}
        }

        log::info!("🚀 Deploying contract ({} bytes of init code)", data.len());

        let mut request = TransactionRequest::new().data(data).value(options.value);
        request.from = options.from;
        if let Some(gas) = options.gas {
            request = request.gas(gas);
        }

        let receipt = send_and_confirm(client, &request, receipt_wait, "constructor").await?;
        let address = receipt.contract_address.ok_or_else(|| {
            SoltestError::deployment_failed(
                receipt.transaction_hash.to_string(),
                "receipt has no contract address",
            )
        })?;

        log::info!("   ✅ Deployed at {}", address);

        let contract = Self {
            client: client.clone(),
            address,
            abi: artifact.abi.clone(),
            default_account: options.from,
            receipt_wait,
        };
        Ok((contract, receipt))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Resolve a method by name, picking the overload with matching arity
    pub fn function(&self, name: &str, arg_count: usize) -> Result<&Function, SoltestError> {
        let overloads = self
            .abi
            .function(name)
            .ok_or_else(|| SoltestError::InvalidMethod(name.to_string()))?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arg_count)
            .ok_or_else(|| {
                let arities: Vec<String> =
                    overloads.iter().map(|f| f.inputs.len().to_string()).collect();
                SoltestError::AbiEncoding(format!(
                    "{} takes {} argument(s), {} given",
                    name,
                    arities.join(" or "),
                    arg_count
                ))
            })
    }

    /// Selector followed by the ABI-encoded arguments
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Bytes, SoltestError> {
        let function = self.function(name, args.len())?;
        function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(SoltestError::abi)
    }

    /// Read-only call, decoded according to the method's outputs
    pub async fn call(
        &self,
        name: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, SoltestError> {
        let function = self.function(name, args.len())?;
        let data = self.encode_call(name, args)?;

        let mut request = TransactionRequest::new().to(self.address).data(data);
        request.from = self.default_account;

        let output = self.client.call(&request).await?;
        log::debug!("   {}() returned {} bytes", name, output.len());

        if output.is_empty() && !function.outputs.is_empty() {
            return Err(SoltestError::InvalidResponse(format!(
                "{}() returned no data; is a contract deployed at {}?",
                name, self.address
            )));
        }

        function.abi_decode_output(&output).map_err(SoltestError::abi)
    }

    /// State-changing call; waits for the receipt and checks its status
    pub async fn transact(
        &self,
        name: &str,
        args: &[DynSolValue],
        options: TxOptions,
    ) -> Result<TransactionReceipt, SoltestError> {
        let function = self.function(name, args.len())?;
        ensure_payable(function.state_mutability, options.value, name)?;
        let data = self.encode_call(name, args)?;

        let mut request = TransactionRequest::new()
            .to(self.address)
            .data(data)
            .value(options.value);
        request.from = options.from.or(self.default_account);
        if let Some(gas) = options.gas {
            request = request.gas(gas);
        }

        log::info!("📝 {}({} arg(s))", name, args.len());
        send_and_confirm(&self.client, &request, self.receipt_wait, name).await
    }
}

/// Refuse to attach ether where the ABI says it would be rejected
fn ensure_payable(
    mutability: StateMutability,
    value: U256,
    label: &str,
) -> Result<(), SoltestError> {
    if value.is_zero() || mutability == StateMutability::Payable {
        return Ok(());
    }
    log::error!("   ❌ {} is not payable, refusing to send {} wei", label, value);
    Err(SoltestError::NonPayable(label.to_string()))
}

async fn send_and_confirm(
    client: &EthRpcClient,
    request: &TransactionRequest,
    receipt_wait: ReceiptWait,
    label: &str,
) -> Result<TransactionReceipt, SoltestError> {
    let tx_hash = client.send_transaction(request).await?;
    log::debug!("   Sent {} as {}", label, tx_hash);

    let receipt = client
        .wait_for_transaction_receipt(tx_hash, receipt_wait)
        .await?;

    if !receipt.succeeded() {
        log::error!("   ❌ {} reverted ({})", label, tx_hash);
        return Err(SoltestError::TransactionReverted(format!(
            "{} in {}",
            label, tx_hash
        )));
    }

    log::debug!(
        "   Mined {} in block {:?}",
        tx_hash,
        receipt.block_number.map(|n| n.to::<u64>())
    );
    Ok(receipt)
}

//! soltest: deploy and exercise a compiled contract on a local Ethereum node
//!
//! This crate drives an Ethereum-compatible JSON-RPC node (Ganache, Anvil,
//! Hardhat, geth --dev) through a fixed sequence of contract interactions.
//! Signing and execution stay on the node; transactions are sent from its
//! unlocked accounts with `eth_sendTransaction`.
//!
//! # Architecture
//!
//! - **RPC client**: JSON-RPC 2.0 over HTTP, receipt polling
//! - **Artifacts**: ABI plus creation bytecode from compiler output
//! - **Contract**: method calls and transactions by name via the ABI
//! - **Scenario**: deploy, authorize, query and transfer, in order
//!
//! # Example
//!
//! ```ignore
//! use soltest::{scenario, SoltestConfig};
//!
//! let config = SoltestConfig::from_env()?;
//! let report = scenario::run(&config).await?;
//! println!("{}", report);
//! ```

// Public modules
pub mod artifact;
pub mod config;
pub mod contract;
pub mod contract_library;
pub mod error;
pub mod rpc;
pub mod scenario;
pub mod wallet;

// Re-exports for convenience
pub use artifact::ContractArtifact;
pub use config::{ArtifactSource, ReceiptWait, SoltestConfig};
pub use contract::{Contract, TxOptions};
pub use contract_library::ContractLibrary;
pub use error::SoltestError;
pub use rpc::{EthRpcClient, TransactionReceipt, TransactionRequest};
pub use scenario::ScenarioReport;
pub use wallet::AuthorizedWallet;

// Re-export commonly used Ethereum types
pub use alloy_dyn_abi::DynSolValue;
pub use alloy_primitives::{Address, Bytes, B256, U256};

// Common result type
pub type Result<T> = std::result::Result<T, SoltestError>;

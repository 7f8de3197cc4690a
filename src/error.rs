//! Error types for soltest operations
//!
//! Covers transport failures, node-side JSON-RPC errors, contract interface
//! problems and transaction outcomes observed through receipts.

use thiserror::Error;

/// Core error type for soltest operations
#[derive(Error, Debug)]
pub enum SoltestError {
    /// Failed to reach the node
    #[error("Failed to connect to Ethereum node: {0}")]
    ConnectionFailed(String),

    /// The node answered with a JSON-RPC error object
    #[error("JSON-RPC error {code} from {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// Response could not be interpreted
    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),

    /// Node does not expose enough unlocked accounts
    #[error("Node exposes {found} accounts, at least {required} required")]
    MissingAccounts { required: usize, found: usize },

    /// Contract artifact (ABI or bytecode) is unusable
    #[error("Invalid contract artifact: {0}")]
    InvalidArtifact(String),

    /// Method not present in the contract ABI
    #[error("Invalid method name: {0}")]
    InvalidMethod(String),

    /// Arguments or return data did not match the ABI
    #[error("ABI encoding error: {0}")]
    AbiEncoding(String),

    /// Ether attached to a function or constructor that is not payable
    #[error("Sending non-zero ether to non-payable {0}")]
    NonPayable(String),

    /// Deployment receipt carried no contract address
    #[error("Deployment failed: tx={tx_hash}, reason={reason}")]
    DeploymentFailed { tx_hash: String, reason: String },

    /// Receipt status was 0
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    /// No receipt observed before the deadline
    #[error("Transaction {tx_hash} not mined after {waited_secs}s")]
    ReceiptTimeout { tx_hash: String, waited_secs: u64 },

    /// Bad or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Helper functions for common error scenarios
impl SoltestError {
    /// Create a connection failed error
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    /// Create a deployment failed error
    pub fn deployment_failed(tx_hash: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeploymentFailed {
            tx_hash: tx_hash.into(),
            reason: reason.into(),
        }
    }

    /// Create an ABI encoding error from any displayable cause
    pub fn abi(err: impl std::fmt::Display) -> Self {
        Self::AbiEncoding(err.to_string())
    }
}

impl From<reqwest::Error> for SoltestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }
}

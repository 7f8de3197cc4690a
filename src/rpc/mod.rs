// Ethereum JSON-RPC integration
// Provides the HTTP client used to talk to the node

pub mod client;
pub mod types;

pub use client::EthRpcClient;
pub use types::*;

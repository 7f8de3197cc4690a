/// EVM Mock Node Library
///
/// A development-node stand-in that answers Ethereum JSON-RPC over HTTP
/// from an in-memory chain. Usable as a standalone binary or started
/// in-process from tests.
pub mod chain;
pub mod handlers;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use chain::MockChain;
pub use server::{create_router, run_server, MockNode};
pub use types::*;

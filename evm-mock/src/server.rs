/// Axum HTTP server setup and routing
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chain::MockChain;
use crate::handlers::*;

pub fn create_router(state: AppState) -> Router {
    // Browser tooling (e.g. Remix) talks to dev nodes cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // JSON-RPC endpoint
        .route("/", post(json_rpc))
        // Health check
        .route("/health", get(health_check))
        // Test helper endpoints
        .route("/mock/status", get(mock_status))
        .route("/mock/revert-next", post(revert_next))
        // Shared state
        .with_state(state)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: AppState, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 EVM mock node listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// A mock node running on an ephemeral local port
pub struct MockNode {
    pub addr: SocketAddr,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl MockNode {
    /// Start a node with `account_count` funded accounts
    pub async fn start(account_count: u8) -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(MockChain::new(account_count)?));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = create_router(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("Mock node stopped: {}", e);
            }
        });

        log::debug!("Mock node on {}", addr);
        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Run `f` against the simulated chain
    pub fn with_chain<R>(&self, f: impl FnOnce(&mut MockChain) -> R) -> R {
        let mut chain = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut chain)
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

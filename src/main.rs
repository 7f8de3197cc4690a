use anyhow::Context;
use soltest::{scenario, SoltestConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger (set RUST_LOG=debug to see every JSON-RPC exchange)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SoltestConfig::from_env().context("Failed to load configuration")?;

    log::info!("Starting contract exercise against {}", config.rpc_url);
    let report = scenario::run(&config)
        .await
        .context("Contract exercise failed")?;

    println!("{}", report);
    Ok(())
}

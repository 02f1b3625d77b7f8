//! # HushNode Entry Point

use anyhow::Result;
use node_runtime::{build_node, NodeConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Unrecoverable failure");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            NodeConfig::from_file(&path)?
        }
        None => NodeConfig::default(),
    };

    // Verifying keys are installed by the credential loader; without one
    // the node runs with reaction proofs rejected.
    let verifier = hn_reactions::VerifierRegistry::new();

    let mut node = build_node(config, verifier).await?;
    node.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    node.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

//! HTTP server for collection generation.
//!
//! Loads the collection snapshot, wires the Anthropic and TMDB clients
//! into the orchestrator and serves the generate routes.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use server::config::{ProviderArgs, ServeArgs, StoreArgs, init_tracing};

/// FlickVault generation server
#[derive(Parser)]
#[command(name = "flickvault-server")]
#[command(about = "Serves AI-assisted collection generation over HTTP", long_about = None)]
struct Args {
    #[command(flatten)]
    providers: ProviderArgs,

    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    info!("Loading collections from {}", args.store.data.display());
    let index = args.store.load()?;
    info!("Loaded {} collections", index.len());

    let orchestrator = args.providers.build_orchestrator(Arc::new(index))?;
    server::http::serve(args.serve.bind, orchestrator).await?;

    Ok(())
}

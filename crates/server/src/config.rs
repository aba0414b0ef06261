//! Command-line / environment configuration shared by the binaries.
//!
//! Every setting is a flag with an environment fallback; a `.env` file is
//! loaded by the binaries before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use catalog::{CollectionIndex, CollectionStore};
use sources::AnthropicSource;
use sources::anthropic::{DEFAULT_BASE_URL as ANTHROPIC_BASE_URL, DEFAULT_MODEL};
use tmdb_client::{DEFAULT_BASE_URL as TMDB_BASE_URL, TmdbClient, TmdbConfig};

use crate::orchestrator::{GenerationConfig, GenerationOrchestrator};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,server=debug,sources=debug,pipeline=debug";

/// Upstream credentials and orchestrator tunables
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: String,

    /// Anthropic model used for suggestions
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub anthropic_model: String,

    /// Anthropic API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = ANTHROPIC_BASE_URL)]
    pub anthropic_base_url: String,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[arg(long, env = "TMDB_BASE_URL", default_value = TMDB_BASE_URL)]
    pub tmdb_base_url: String,

    /// Suggestion rounds per generation
    #[arg(long, env = "FLICKVAULT_MAX_ROUNDS", default_value_t = 5)]
    pub max_rounds: usize,

    /// Concurrent metadata lookups per round
    #[arg(long, env = "FLICKVAULT_ENRICH_CONCURRENCY", default_value_t = 4)]
    pub enrich_concurrency: usize,
}

/// Where the collection snapshot lives
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Collection snapshot file
    #[arg(long, env = "FLICKVAULT_DATA", default_value = "data/collections.json")]
    pub data: PathBuf,
}

impl StoreArgs {
    pub fn load(&self) -> Result<CollectionIndex> {
        CollectionIndex::load_or_default(&self.data)
            .with_context(|| format!("Failed to load collections from {}", self.data.display()))
    }
}

/// Server bind settings
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "FLICKVAULT_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,
}

impl ProviderArgs {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::default()
            .with_max_rounds(self.max_rounds)
            .with_enrich_concurrency(self.enrich_concurrency)
    }

    /// Wire the Anthropic source, the TMDB client and a collection store
    /// into an orchestrator.
    pub fn build_orchestrator(&self, store: Arc<dyn CollectionStore>) -> Result<GenerationOrchestrator> {
        let suggestions = AnthropicSource::new(self.anthropic_api_key.clone())
            .context("Failed to create Anthropic client")?
            .with_model(self.anthropic_model.clone())
            .with_base_url(self.anthropic_base_url.clone());

        let metadata = TmdbClient::new(
            TmdbConfig::new(self.tmdb_api_key.clone()).with_base_url(self.tmdb_base_url.clone()),
        )
        .context("Failed to create TMDB client")?;

        info!(
            model = %self.anthropic_model,
            max_rounds = self.max_rounds,
            enrich_concurrency = self.enrich_concurrency,
            "Configured generation pipeline"
        );

        Ok(
            GenerationOrchestrator::new(Arc::new(suggestions), Arc::new(metadata), store)
                .with_config(self.generation_config()),
        )
    }
}

/// Install the fmt subscriber, honouring `RUST_LOG`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}

use anyhow::{anyhow, bail, Context, Result};
use catalog::{import, CollectionId, CollectionIndex, MediaType, MemberTitle};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use futures::StreamExt;
use server::config::{init_tracing, ProviderArgs, ServeArgs, StoreArgs};
use server::{GenerationEvent, GenerationOutcome, GenerationRequest};
use sources::ExclusionSetBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// FlickVault - AI-assisted movie and TV collections
#[derive(Parser)]
#[command(name = "flickvault")]
#[command(about = "Curate hierarchical movie/TV collections and expand them from a prompt", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate titles and print the final list
    Generate {
        #[command(flatten)]
        providers: ProviderArgs,

        #[command(flatten)]
        request: RequestArgs,

        /// Save the results as a new collection (a child of --from, if given)
        #[arg(long)]
        save: bool,
    },

    /// Generate titles and print every event as an NDJSON line
    Stream {
        #[command(flatten)]
        providers: ProviderArgs,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Import titles from a JSON export into a collection (created if missing)
    Import {
        /// Collection name
        collection: String,

        /// JSON file: an array, a single title, or a watchlist export
        file: PathBuf,

        /// Media type for a newly created collection
        #[arg(long, default_value = "movie")]
        media_type: MediaType,
    },

    /// Show a collection's ancestor chain and exclusion set size
    Lineage {
        /// Collection ID
        collection_id: CollectionId,
    },

    /// Run the HTTP server
    Serve {
        #[command(flatten)]
        providers: ProviderArgs,

        #[command(flatten)]
        serve: ServeArgs,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// What the collection should contain
    #[arg(long)]
    prompt: String,

    /// Number of titles to generate
    #[arg(long, default_value = "10")]
    count: usize,

    /// movie or show
    #[arg(long, default_value = "movie")]
    media_type: MediaType,

    /// Minimum TMDB rating (0-10)
    #[arg(long)]
    min_rating: Option<f32>,

    /// Expand this collection: nothing from its lineage is suggested again
    #[arg(long)]
    from: Option<CollectionId>,
}

impl RequestArgs {
    fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            media_type: self.media_type,
            target_count: self.count,
            min_rating: self.min_rating,
            source_collection_id: self.from,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Generate {
            providers,
            request,
            save,
        } => handle_generate(&cli.store, &providers, &request, save).await?,
        Commands::Stream { providers, request } => {
            handle_stream(&cli.store, &providers, &request).await?
        }
        Commands::Import {
            collection,
            file,
            media_type,
        } => handle_import(&cli.store, &collection, &file, media_type)?,
        Commands::Lineage { collection_id } => handle_lineage(&cli.store, collection_id).await?,
        Commands::Serve { providers, serve } => {
            let index = cli.store.load()?;
            let orchestrator = providers.build_orchestrator(Arc::new(index))?;
            server::http::serve(serve.bind, orchestrator).await?;
        }
    }

    Ok(())
}

/// Handle the 'generate' command
async fn handle_generate(
    store: &StoreArgs,
    providers: &ProviderArgs,
    args: &RequestArgs,
    save: bool,
) -> Result<()> {
    let index = store.load()?;
    let orchestrator = providers.build_orchestrator(Arc::new(index.clone()))?;

    let start = Instant::now();
    let (outcome, failure) = match orchestrator.generate(args.to_request()).await {
        Ok(outcome) => (outcome, None),
        Err(failure) => (failure.partial.clone(), Some(failure)),
    };

    print_outcome(&outcome);
    let mark = if failure.is_some() { "✗".red() } else { "✓".green() };
    println!(
        "{} {} of {} in {:.1?}",
        mark,
        outcome.total,
        args.count,
        start.elapsed()
    );

    // Results accepted before a failure are kept
    if save {
        save_outcome(store, index, args, outcome)?;
    }

    match failure {
        Some(failure) => Err(anyhow!("{} ({})", failure, failure.kind())),
        None => Ok(()),
    }
}

/// Handle the 'stream' command
async fn handle_stream(store: &StoreArgs, providers: &ProviderArgs, args: &RequestArgs) -> Result<()> {
    let index = store.load()?;
    let orchestrator = providers.build_orchestrator(Arc::new(index))?;

    let mut events = orchestrator.stream(args.to_request());
    let mut failed = false;
    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string(&event)?);
        failed |= matches!(event, GenerationEvent::Error { .. });
    }

    if failed {
        bail!("generation failed");
    }
    Ok(())
}

/// Handle the 'import' command
fn handle_import(
    store: &StoreArgs,
    collection: &str,
    file: &Path,
    media_type: MediaType,
) -> Result<()> {
    let mut index = store.load()?;
    let titles = import::load_titles_from_file(file)
        .with_context(|| format!("Failed to read titles from {}", file.display()))?;

    let (id, media_type) = match index.get_by_name(collection) {
        Some(existing) => (existing.id, existing.media_type),
        None => {
            let id = index.create_collection(collection, "", media_type, None)?;
            println!("{} Created collection '{}' (id {})", "✓".green(), collection, id);
            (id, media_type)
        }
    };

    let summary = index.add_members(id, media_type, titles)?;
    index.save_to_file(&store.data)?;

    println!("{}", format!("Imported into '{}':", collection).bold().blue());
    println!("{}Added: {}", "• ".green(), summary.added);
    println!("{}Skipped: {}", "• ".yellow(), summary.skipped);
    println!("{}Total: {}", "• ".cyan(), summary.total);
    Ok(())
}

/// Handle the 'lineage' command
async fn handle_lineage(store: &StoreArgs, collection_id: CollectionId) -> Result<()> {
    let index = Arc::new(store.load()?);
    let builder = ExclusionSetBuilder::new(index);

    let lineage = builder.resolve_lineage(collection_id).await?;
    println!("{}", format!("Lineage of collection {}:", collection_id).bold().blue());
    for (depth, record) in lineage.iter().enumerate() {
        println!(
            "{}{} [{}] {} ({} titles)",
            "  ".repeat(depth),
            record.id.to_string().green(),
            record.media_type,
            record.name,
            record.members.len()
        );
    }

    let exclusions = builder.build(Some(collection_id)).await?;
    println!("Exclusion set: {} distinct titles", exclusions.len());
    Ok(())
}

/// Store generated results as a new collection
fn save_outcome(
    store: &StoreArgs,
    mut index: CollectionIndex,
    args: &RequestArgs,
    outcome: GenerationOutcome,
) -> Result<()> {
    if outcome.results.is_empty() {
        println!("{}", "Nothing to save".yellow());
        return Ok(());
    }

    let name = outcome
        .name
        .clone()
        .unwrap_or_else(|| args.prompt.trim().to_string());
    let description = outcome.description.clone().unwrap_or_default();

    let id = index.create_collection(&name, &description, args.media_type, args.from)?;
    let members: Vec<MemberTitle> = outcome.results.into_iter().map(MemberTitle::from).collect();
    let summary = index.add_members(id, args.media_type, members)?;
    index.save_to_file(&store.data)?;

    let saved_name = index.get(id).map(|c| c.name.as_str()).unwrap_or(&name);
    println!(
        "{} Saved {} titles to '{}' (id {})",
        "✓".green(),
        summary.added,
        saved_name,
        id
    );
    Ok(())
}

/// Helper function to format and print generated titles
fn print_outcome(outcome: &GenerationOutcome) {
    if let Some(name) = &outcome.name {
        println!("{}", name.bold().blue());
    }
    if let Some(description) = &outcome.description {
        println!("{}", description.dimmed());
    }

    for (rank, result) in outcome.results.iter().enumerate() {
        let year = result
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        let rating = result
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} ({}) - Rating: {}",
            (rank + 1).to_string().green(),
            result.title,
            year,
            rating
        );
    }
}

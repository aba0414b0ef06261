//! # Generation Orchestrator
//!
//! This module turns a prompt into a deduplicated, rating-filtered,
//! lineage-aware sequence of enriched titles:
//! 1. Validate the request
//! 2. Build the exclusion set from the source collection's lineage (once)
//! 3. Per round: ask the suggestion source for `remaining * factor` titles
//! 4. Skip candidates already seen this run, enrich the rest concurrently
//! 5. Filter (exclusion, rating), dedup by identity, emit each accepted result
//! 6. Stop when the target is met or the round budget is spent
//! 7. Emit exactly one terminal event: `complete` or `error`
//!
//! ## Delivery
//! [`GenerationOrchestrator::run`] is the single producer. `stream` spawns
//! it and hands back the receiving end; `generate` drains it in place and
//! returns the aggregate. Both go through the same code path.
//!
//! ## Cancellation
//! Dropping the receiver stops the run at the next emission or round
//! boundary. Nothing already emitted is retracted.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, instrument, warn};

use catalog::{Candidate, CollectionId, CollectionStore, EnrichedResult, MediaType};
use pipeline::{DedupIndex, FilterPipeline};
use sources::{
    ExclusionSet, ExclusionSetBuilder, LineageError, SuggestionRequest, SuggestionSource,
};
use tmdb_client::{Enrichment, MetadataProvider};

/// Default number of titles to generate
pub const DEFAULT_TARGET_COUNT: usize = 10;
/// Largest target a single request may ask for
pub const MAX_TARGET_COUNT: usize = 50;

/// Capacity of the event channel between producer and consumer
const EVENT_BUFFER: usize = 32;

fn default_target_count() -> usize {
    DEFAULT_TARGET_COUNT
}

// ============================================================================
// Request / Config
// ============================================================================

/// One generation call. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default = "default_target_count", alias = "movie_count", alias = "count")]
    pub target_count: usize,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub source_collection_id: Option<CollectionId>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, target_count: usize) -> Self {
        Self {
            prompt: prompt.into(),
            media_type: MediaType::Movie,
            target_count,
            min_rating: None,
            source_collection_id: None,
        }
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn with_min_rating(mut self, min_rating: f32) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    /// Expand an existing collection: its lineage becomes the exclusion set
    pub fn with_source_collection(mut self, id: CollectionId) -> Self {
        self.source_collection_id = Some(id);
        self
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.target_count == 0 || self.target_count > MAX_TARGET_COUNT {
            return Err(GenerationError::InvalidRequest(format!(
                "target_count must be between 1 and {}, got {}",
                MAX_TARGET_COUNT, self.target_count
            )));
        }
        if let Some(rating) = self.min_rating {
            if !rating.is_finite() || !(0.0..=10.0).contains(&rating) {
                return Err(GenerationError::InvalidRequest(format!(
                    "min_rating must be between 0 and 10, got {}",
                    rating
                )));
            }
        }
        Ok(())
    }
}

/// Orchestrator tunables
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Hard bound on suggestion rounds per run
    pub max_rounds: usize,
    /// How much to over-ask to absorb enrichment misses and dedup hits
    pub inflation_factor: f32,
    pub min_count_hint: usize,
    pub max_count_hint: usize,
    /// Enrichment lookups in flight per round
    pub enrich_concurrency: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            inflation_factor: 1.5,
            min_count_hint: 1,
            max_count_hint: 50,
            enrich_concurrency: 4,
        }
    }
}

impl GenerationConfig {
    /// Configure the round budget (default: 5)
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    /// Configure the over-ask factor (default: 1.5)
    pub fn with_inflation_factor(mut self, factor: f32) -> Self {
        self.inflation_factor = factor.max(1.0);
        self
    }

    /// Configure the count hint clamp (default: 1..=50)
    pub fn with_count_hint_range(mut self, min: usize, max: usize) -> Self {
        self.min_count_hint = min.max(1);
        self.max_count_hint = max.max(self.min_count_hint);
        self
    }

    /// Configure enrichment concurrency (default: 4)
    pub fn with_enrich_concurrency(mut self, concurrency: usize) -> Self {
        self.enrich_concurrency = concurrency.max(1);
        self
    }

    /// Titles to ask for when `remaining` are still needed
    pub fn count_hint(&self, remaining: usize) -> usize {
        let inflated = (remaining as f32 * self.inflation_factor).ceil() as usize;
        inflated.clamp(self.min_count_hint, self.max_count_hint)
    }
}

// ============================================================================
// Events / Errors / Outcome
// ============================================================================

/// What a run emits, in order: progress/result events, then one terminal
/// `complete` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    Progress {
        round: usize,
        found_so_far: usize,
    },
    Result {
        item: EnrichedResult,
    },
    Complete {
        total: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Error {
        message: String,
        kind: String,
    },
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Complete { .. } | GenerationEvent::Error { .. }
        )
    }
}

/// Failures that end a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Collection {id} not found")]
    CollectionNotFound { id: CollectionId },

    #[error("Corrupt collection lineage: {0}")]
    CorruptLineage(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl GenerationError {
    /// Stable wire name carried on `error` events
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InvalidRequest(_) => "invalid_request",
            GenerationError::CollectionNotFound { .. } => "collection_not_found",
            GenerationError::CorruptLineage(_) => "corrupt_lineage",
            GenerationError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}

impl From<LineageError> for GenerationError {
    fn from(err: LineageError) -> Self {
        match err {
            LineageError::CollectionNotFound { id } => GenerationError::CollectionNotFound { id },
            LineageError::Store(e) => {
                GenerationError::UpstreamUnavailable(format!("collection store: {}", e))
            }
            corrupt => GenerationError::CorruptLineage(corrupt.to_string()),
        }
    }
}

/// Aggregate returned by the synchronous call shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub results: Vec<EnrichedResult>,
    pub total: usize,
}

/// A synchronous run that failed, with everything accepted before the
/// failure.
///
/// Accepted results are never retracted; the caller decides whether to
/// keep them.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct GenerationFailure {
    pub error: GenerationError,
    pub partial: GenerationOutcome,
}

impl GenerationFailure {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}

impl From<GenerationError> for GenerationFailure {
    fn from(error: GenerationError) -> Self {
        Self {
            error,
            partial: GenerationOutcome::default(),
        }
    }
}

/// Bookkeeping for one run, returned by [`GenerationOrchestrator::run`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub rounds: usize,
    pub name: Option<String>,
    pub description: Option<String>,
    /// The receiver went away before the terminal event
    pub cancelled: bool,
}

/// Why `execute` stopped early
enum Stop {
    Failed(GenerationError),
    Cancelled,
}

impl From<GenerationError> for Stop {
    fn from(err: GenerationError) -> Self {
        Stop::Failed(err)
    }
}

async fn emit(events: &mpsc::Sender<GenerationEvent>, event: GenerationEvent) -> Result<(), Stop> {
    events.send(event).await.map_err(|_| Stop::Cancelled)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Coordinates suggestion, enrichment, exclusion and dedup for each run.
///
/// Holds no per-run state, so one instance serves concurrent runs.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    suggestions: Arc<dyn SuggestionSource>,
    metadata: Arc<dyn MetadataProvider>,
    exclusions: ExclusionSetBuilder,
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        suggestions: Arc<dyn SuggestionSource>,
        metadata: Arc<dyn MetadataProvider>,
        store: Arc<dyn CollectionStore>,
    ) -> Self {
        Self {
            suggestions,
            metadata,
            exclusions: ExclusionSetBuilder::new(store),
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the exclusion set builder (e.g. a different depth bound)
    pub fn with_exclusion_builder(mut self, builder: ExclusionSetBuilder) -> Self {
        self.exclusions = builder;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Streaming call shape: events arrive as they are produced.
    ///
    /// Must be called inside a tokio runtime; the producer is spawned.
    pub fn stream(&self, request: GenerationRequest) -> ReceiverStream<GenerationEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let orchestrator = self.clone();
        tokio::spawn(async move {
            // Outcome is already logged and emitted by run
            orchestrator.run(request, tx).await.ok();
        });
        ReceiverStream::new(rx)
    }

    /// Synchronous call shape: drain the run and return the aggregate.
    ///
    /// On failure the results accepted so far travel with the error.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationFailure> {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

        let collect = async move {
            let mut results = Vec::new();
            while let Some(event) = rx.recv().await {
                if let GenerationEvent::Result { item } = event {
                    results.push(item);
                }
            }
            results
        };

        let ((summary, failure), results) = tokio::join!(self.drive(request, tx), collect);

        let outcome = GenerationOutcome {
            name: summary.name,
            description: summary.description,
            total: results.len(),
            results,
        };
        match failure {
            Some(error) => Err(GenerationFailure {
                error,
                partial: outcome,
            }),
            None => Ok(outcome),
        }
    }

    /// Run one generation, pushing every event onto `events`.
    ///
    /// Always ends with exactly one terminal event unless the receiver was
    /// dropped first. The typed error is returned as well as emitted.
    pub async fn run(
        &self,
        request: GenerationRequest,
        events: mpsc::Sender<GenerationEvent>,
    ) -> Result<RunSummary, GenerationError> {
        match self.drive(request, events).await {
            (_, Some(err)) => Err(err),
            (summary, None) => Ok(summary),
        }
    }

    #[instrument(
        skip(self, request, events),
        fields(target = request.target_count, media_type = %request.media_type)
    )]
    async fn drive(
        &self,
        request: GenerationRequest,
        events: mpsc::Sender<GenerationEvent>,
    ) -> (RunSummary, Option<GenerationError>) {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        match self.execute(&request, &events, &mut summary).await {
            Ok(()) => {
                info!(
                    total = summary.total,
                    rounds = summary.rounds,
                    elapsed = ?start_time.elapsed(),
                    "Generation complete"
                );
                let complete = GenerationEvent::Complete {
                    total: summary.total,
                    name: summary.name.clone(),
                    description: summary.description.clone(),
                };
                if events.send(complete).await.is_err() {
                    summary.cancelled = true;
                }
                (summary, None)
            }
            Err(Stop::Cancelled) => {
                info!(
                    total = summary.total,
                    rounds = summary.rounds,
                    "Receiver dropped, generation cancelled"
                );
                summary.cancelled = true;
                (summary, None)
            }
            Err(Stop::Failed(err)) => {
                warn!(
                    kind = err.kind(),
                    error = %err,
                    emitted = summary.total,
                    "Generation failed"
                );
                let event = GenerationEvent::Error {
                    message: err.to_string(),
                    kind: err.kind().to_string(),
                };
                // Nobody left to tell if this fails
                events.send(event).await.ok();
                (summary, Some(err))
            }
        }
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        events: &mpsc::Sender<GenerationEvent>,
        summary: &mut RunSummary,
    ) -> Result<(), Stop> {
        request.validate()?;

        let exclusions = self
            .exclusions
            .build(request.source_collection_id)
            .await
            .map_err(GenerationError::from)?;

        let filters = FilterPipeline::for_generation(request.min_rating);
        let mut dedup = DedupIndex::new();
        let mut accepted: Vec<EnrichedResult> = Vec::with_capacity(request.target_count);
        let mut suggested_titles: Vec<String> = Vec::new();
        let mut last_failure: Option<GenerationError> = None;

        info!(
            excluded = exclusions.len(),
            lineage = exclusions.lineage().len(),
            "Starting generation"
        );

        for round in 1..=self.config.max_rounds {
            if events.is_closed() {
                return Err(Stop::Cancelled);
            }
            summary.rounds = round;
            emit(
                events,
                GenerationEvent::Progress {
                    round,
                    found_so_far: accepted.len(),
                },
            )
            .await?;

            let remaining = request.target_count - accepted.len();
            // This run's titles first: the prompt only lists a bounded prefix
            let avoid: Vec<String> = suggested_titles
                .iter()
                .chain(exclusions.display_titles())
                .cloned()
                .collect();
            let suggestion_request = SuggestionRequest {
                prompt: &request.prompt,
                media_type: request.media_type,
                count_hint: self.config.count_hint(remaining),
                min_rating: request.min_rating,
                excluded_titles: &avoid,
            };

            let batch = match self.suggestions.suggest(&suggestion_request).await {
                Ok(batch) => {
                    last_failure = None;
                    batch
                }
                Err(err) => {
                    warn!(
                        round,
                        source = self.suggestions.name(),
                        error = %err,
                        "Suggestion source failed"
                    );
                    last_failure = Some(GenerationError::UpstreamUnavailable(err.to_string()));
                    continue;
                }
            };

            if summary.name.is_none() {
                summary.name = batch.name;
            }
            if summary.description.is_none() {
                summary.description = batch.description;
            }

            let suggested = batch.candidates.len();
            let fresh: Vec<Candidate> = batch
                .candidates
                .into_iter()
                .filter(|c| {
                    let key = c.key();
                    !key.is_empty() && !exclusions.contains_key(&key) && dedup.first_sighting(&key)
                })
                .collect();
            suggested_titles.extend(fresh.iter().map(|c| c.title.clone()));

            debug!(
                round,
                suggested,
                fresh = fresh.len(),
                remaining,
                "Enriching round candidates"
            );

            let enriched = self
                .enrich_round(
                    fresh,
                    request.target_count,
                    &exclusions,
                    &filters,
                    &mut dedup,
                    &mut accepted,
                    events,
                )
                .await;
            summary.total = accepted.len();
            enriched?;

            if accepted.len() >= request.target_count {
                break;
            }
        }

        debug!(
            titles_seen = dedup.seen(),
            accepted = dedup.accepted(),
            rounds = summary.rounds,
            "Rounds finished"
        );

        match last_failure {
            Some(err) => Err(Stop::Failed(err)),
            None => Ok(()),
        }
    }

    /// Enrich a round's candidates and admit results one at a time.
    ///
    /// Lookups run concurrently but complete in candidate order; admission
    /// (filter, dedup check+insert, append, emit) happens only here.
    #[allow(clippy::too_many_arguments)]
    async fn enrich_round(
        &self,
        candidates: Vec<Candidate>,
        target: usize,
        exclusions: &ExclusionSet,
        filters: &FilterPipeline,
        dedup: &mut DedupIndex,
        accepted: &mut Vec<EnrichedResult>,
        events: &mpsc::Sender<GenerationEvent>,
    ) -> Result<(), Stop> {
        let metadata = &self.metadata;
        let mut lookups = stream::iter(candidates.into_iter().map(|candidate| async move {
            let outcome = metadata.enrich(&candidate).await;
            (candidate, outcome)
        }))
        .buffered(self.config.enrich_concurrency);

        while let Some((candidate, outcome)) = lookups.next().await {
            if events.is_closed() {
                return Err(Stop::Cancelled);
            }

            let result = match outcome {
                Ok(Enrichment::Found(result)) => result,
                Ok(Enrichment::NotFound) => {
                    debug!(title = %candidate.title, "No metadata match, skipping");
                    continue;
                }
                Err(err) => {
                    return Err(GenerationError::UpstreamUnavailable(format!(
                        "metadata lookup for \"{}\" failed: {}",
                        candidate.title, err
                    ))
                    .into());
                }
            };

            if !filters.admits(&result, exclusions) || !dedup.try_accept(&result) {
                continue;
            }

            accepted.push(result.clone());
            emit(events, GenerationEvent::Result { item: result }).await?;

            if accepted.len() >= target {
                break;
            }
        }
        Ok(())
    }
}

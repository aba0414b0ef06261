//! Deterministic in-process stand-ins for the suggestion and metadata
//! backends, shared by the orchestrator and HTTP tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog::{Candidate, EnrichedResult, MediaType, normalize_title};
use sources::suggestion::user_message;
use sources::{SuggestionBatch, SuggestionError, SuggestionRequest, SuggestionSource};
use tmdb_client::{Enrichment, MetadataProvider, TmdbError};

/// A batch of movie candidates with no years
pub fn batch(titles: &[&str]) -> SuggestionBatch {
    batch_of(MediaType::Movie, titles)
}

pub fn batch_of(media_type: MediaType, titles: &[&str]) -> SuggestionBatch {
    SuggestionBatch {
        name: Some("Stub Collection".to_string()),
        description: None,
        candidates: titles
            .iter()
            .map(|t| Candidate::new(*t, None, media_type))
            .collect(),
    }
}

pub fn unavailable() -> SuggestionError {
    SuggestionError::Status {
        status: 529,
        body: "overloaded".to_string(),
    }
}

/// What the orchestrator asked for on one round
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub count_hint: usize,
    pub excluded_titles: Vec<String>,
    /// The user message the Anthropic source would have sent
    pub message: String,
}

/// Plays back a fixed script of responses, then empty batches
pub struct ScriptedSuggestions {
    script: Mutex<VecDeque<Result<SuggestionBatch, SuggestionError>>>,
    repeat: Option<SuggestionBatch>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedSuggestions {
    pub fn new(script: Vec<Result<SuggestionBatch, SuggestionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the same batch on every round
    pub fn repeating(batch: SuggestionBatch) -> Self {
        Self {
            repeat: Some(batch),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSuggestions {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn suggest(
        &self,
        request: &SuggestionRequest<'_>,
    ) -> Result<SuggestionBatch, SuggestionError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            count_hint: request.count_hint,
            excluded_titles: request.excluded_titles.to_vec(),
            message: user_message(request),
        });

        if let Some(batch) = &self.repeat {
            return Ok(batch.clone());
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SuggestionBatch::default()))
    }
}

/// Metadata backend keyed by normalized title.
///
/// Titles it does not know are `NotFound`. The TMDB id defaults to
/// `tmdb-<normalized title>`.
#[derive(Default)]
pub struct StubMetadata {
    default_rating: Option<Option<f32>>,
    ratings: HashMap<String, Option<f32>>,
    external_ids: HashMap<String, String>,
    missing: HashSet<String>,
    delays: HashMap<String, Duration>,
    failing: bool,
    looked_up: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl StubMetadata {
    /// Every title resolves with the same rating
    pub fn rating_everything(rating: f32) -> Self {
        Self {
            default_rating: Some(Some(rating)),
            ..Self::default()
        }
    }

    pub fn with_rating(mut self, title: &str, rating: Option<f32>) -> Self {
        self.ratings.insert(normalize_title(title), rating);
        self
    }

    pub fn with_external_id(mut self, title: &str, id: &str) -> Self {
        self.external_ids.insert(normalize_title(title), id.to_string());
        self
    }

    /// This title has no match
    pub fn without(mut self, title: &str) -> Self {
        self.missing.insert(normalize_title(title));
        self
    }

    /// This title's lookup takes `delay` to answer
    pub fn with_delay(mut self, title: &str, delay: Duration) -> Self {
        self.delays.insert(normalize_title(title), delay);
        self
    }

    /// Every lookup fails as if TMDB were unreachable
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Titles in the order their lookups started
    pub fn looked_up(&self) -> Vec<String> {
        self.looked_up.lock().unwrap().clone()
    }

    /// Titles in the order their lookups answered
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    async fn enrich(&self, candidate: &Candidate) -> Result<Enrichment, TmdbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.looked_up.lock().unwrap().push(candidate.title.clone());

        if self.failing {
            return Err(TmdbError::Transport("connection refused".to_string()));
        }

        let key = normalize_title(&candidate.title);
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        self.finished.lock().unwrap().push(candidate.title.clone());

        if self.missing.contains(&key) {
            return Ok(Enrichment::NotFound);
        }
        let Some(rating) = self.ratings.get(&key).copied().or(self.default_rating) else {
            return Ok(Enrichment::NotFound);
        };

        let mut result = EnrichedResult::from_candidate(candidate);
        result.external_id = Some(
            self.external_ids
                .get(&key)
                .cloned()
                .unwrap_or_else(|| format!("tmdb-{}", key)),
        );
        result.rating = rating;
        result.overview = format!("Overview of {}", candidate.title);
        Ok(Enrichment::Found(result))
    }
}

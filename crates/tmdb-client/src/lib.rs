//! Metadata enrichment client for The Movie Database (TMDB).
//!
//! This crate resolves a suggested title to TMDB/IMDb identifiers plus
//! poster, overview and rating. It handles:
//! - Title+year search with a title-only fallback
//! - Movie and TV search endpoints
//! - Rate limiting (429) with bounded, `Retry-After`-aware retries
//! - Telling "no match" apart from "TMDB is unreachable"

mod models;

use std::time::Duration;

use async_trait::async_trait;
use catalog::{Candidate, EnrichedResult, MediaType};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use models::{pick_match, ExternalIds, SearchHit, SearchResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Longest `Retry-After` we are willing to wait on
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to TMDB.
///
/// All of these mean the metadata backend is unavailable; a title that
/// simply has no match is reported as [`Enrichment::NotFound`] instead.
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("Failed to build TMDB client: {0}")]
    ClientBuild(String),

    #[error("TMDB request failed: {0}")]
    Transport(String),

    #[error("TMDB rejected the API key (status {0})")]
    Unauthorized(StatusCode),

    #[error("TMDB still returning {status} after {attempts} attempts")]
    RetriesExhausted { status: StatusCode, attempts: usize },

    #[error("TMDB returned status {0}")]
    Status(StatusCode),

    #[error("Invalid response from TMDB: {0}")]
    InvalidResponse(String),
}

/// Result of looking a candidate up
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Found(EnrichedResult),
    NotFound,
}

/// Anything that can attach external metadata to a candidate.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolve a candidate, returning `NotFound` rather than an error when
    /// nothing matches.
    async fn enrich(&self, candidate: &Candidate) -> Result<Enrichment, TmdbError>;
}

/// TMDB client settings
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_base: String,
    pub timeout: Duration,
    /// Extra attempts after a 429 or 5xx
    pub max_retries: usize,
    /// First backoff delay; doubled on every retry
    pub retry_base_delay: Duration,
    /// Ceiling for a single backoff delay
    pub max_retry_delay: Duration,
}

impl TmdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(250),
            max_retry_delay: MAX_RETRY_AFTER,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }
}

/// Client for the TMDB v3 REST API.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TmdbError::ClientBuild(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Search by title and year, falling back to a title-only search when
    /// the year-scoped search comes back empty.
    async fn search(&self, candidate: &Candidate) -> Result<Option<SearchHit>, TmdbError> {
        if let Some(year) = candidate.year {
            let hits = self.search_once(candidate, Some(year)).await?;
            if let Some(hit) = pick_match(&hits, &candidate.title) {
                return Ok(Some(hit.clone()));
            }
            debug!(title = %candidate.title, year, "No year-scoped match, retrying without year");
        }

        let hits = self.search_once(candidate, None).await?;
        Ok(pick_match(&hits, &candidate.title).cloned())
    }

    async fn search_once(
        &self,
        candidate: &Candidate,
        year: Option<i32>,
    ) -> Result<Vec<SearchHit>, TmdbError> {
        let (path, year_param) = match candidate.media_type {
            MediaType::Movie => ("search/movie", "year"),
            MediaType::Show => ("search/tv", "first_air_date_year"),
        };

        let mut query = vec![("query", candidate.title.clone())];
        if let Some(year) = year {
            query.push((year_param, year.to_string()));
        }

        let response: SearchResponse = self.get_json(path, &query).await?;
        Ok(response.results)
    }

    /// Fetch the IMDb id for a hit. Failures here only cost the secondary id.
    async fn fetch_imdb_id(&self, media_type: MediaType, tmdb_id: u64) -> Option<String> {
        let segment = match media_type {
            MediaType::Movie => "movie",
            MediaType::Show => "tv",
        };
        let path = format!("{}/{}/external_ids", segment, tmdb_id);

        match self.get_json::<ExternalIds>(&path, &[]).await {
            Ok(ids) => ids.imdb_id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                warn!(tmdb_id, error = %e, "Failed to fetch external ids");
                None
            }
        }
    }

    /// GET a TMDB path and decode the JSON body, retrying 429 and 5xx.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let attempts = self.config.max_retries + 1;
        let mut last_status = StatusCode::TOO_MANY_REQUESTS;

        for attempt in 0..attempts {
            let response = self
                .client
                .get(&url)
                .query(&[("api_key", self.config.api_key.as_str())])
                .query(query)
                .send()
                .await
                .map_err(|e| TmdbError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| TmdbError::InvalidResponse(e.to_string()));
            }

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(TmdbError::Unauthorized(status));
                }
                StatusCode::TOO_MANY_REQUESTS => {}
                s if s.is_server_error() => {}
                s => return Err(TmdbError::Status(s)),
            }

            last_status = status;
            if attempt + 1 == attempts {
                break;
            }

            let delay = retry_after(&response).unwrap_or_else(|| self.backoff(attempt));
            warn!(
                %status,
                attempt = attempt + 1,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                "TMDB request throttled or failing, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        Err(TmdbError::RetriesExhausted {
            status: last_status,
            attempts,
        })
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        self.config
            .retry_base_delay
            .checked_mul(factor)
            .map_or(self.config.max_retry_delay, |delay| delay.min(self.config.max_retry_delay))
    }

    fn poster_url(&self, poster_path: Option<&str>) -> String {
        match poster_path.filter(|p| !p.is_empty()) {
            Some(path) => format!("{}{}", self.config.image_base, path),
            None => String::new(),
        }
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    #[instrument(skip(self, candidate), fields(title = %candidate.title, year = ?candidate.year))]
    async fn enrich(&self, candidate: &Candidate) -> Result<Enrichment, TmdbError> {
        let Some(hit) = self.search(candidate).await? else {
            debug!("No TMDB match");
            return Ok(Enrichment::NotFound);
        };

        let secondary_id = self.fetch_imdb_id(candidate.media_type, hit.id).await;

        let mut result = EnrichedResult::from_candidate(candidate);
        result.external_id = Some(hit.id.to_string());
        result.secondary_id = secondary_id;
        result.poster_url = self.poster_url(hit.poster_path.as_deref());
        result.overview = hit.overview.clone().unwrap_or_default();
        result.rating = hit.rating();

        debug!(tmdb_id = hit.id, rating = ?result.rating, "Enriched candidate");
        Ok(Enrichment::Found(result))
    }
}

/// Parse a `Retry-After` header given in seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

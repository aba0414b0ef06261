//! # Sources Crate
//!
//! Where generation candidates come from, and what they must avoid.
//!
//! ## Components
//!
//! ### Suggestion Source
//! A language model turns a natural-language prompt into candidate titles:
//! - [`SuggestionSource`] is the seam the orchestrator depends on
//! - [`AnthropicSource`] implements it over the Anthropic Messages API
//! - The count hint is inflated by the caller to absorb attrition
//!
//! ### Exclusion Set Builder
//! Walks a collection's ancestor chain and unions every member title:
//! - Cycle-safe (visited ids plus a depth bound)
//! - Title-only membership, plus any known TMDB / IMDb ids
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{AnthropicSource, ExclusionSetBuilder, SuggestionRequest, SuggestionSource};
//! use catalog::{CollectionIndex, MediaType};
//! use std::sync::Arc;
//!
//! let index = Arc::new(CollectionIndex::load_or_default("data/collections.json".as_ref())?);
//! let exclusions = ExclusionSetBuilder::new(index).build(Some(3)).await?;
//!
//! let source = AnthropicSource::new(api_key)?;
//! let batch = source
//!     .suggest(&SuggestionRequest {
//!         prompt: "slow-burn 70s paranoia thrillers",
//!         media_type: MediaType::Movie,
//!         count_hint: 15,
//!         min_rating: Some(7.0),
//!         excluded_titles: exclusions.display_titles(),
//!     })
//!     .await?;
//! ```

pub mod anthropic;
pub mod exclusion;
pub mod suggestion;

pub use anthropic::AnthropicSource;
pub use exclusion::{ExclusionSet, ExclusionSetBuilder, LineageError, MAX_LINEAGE_DEPTH};
pub use suggestion::{SuggestionBatch, SuggestionError, SuggestionRequest, SuggestionSource};

//! Pipeline for filtering and deduplicating generated titles.
//!
//! This crate provides:
//! - Filter trait and implementations for result filtering
//! - FilterPipeline for composing filters
//! - DedupIndex for the two dedup passes of a generation run
//!
//! ## Architecture
//! The orchestrator runs each candidate through these stages:
//! 1. Title pass: skip candidates already seen (or excluded) this run
//! 2. Enrichment (outside this crate)
//! 3. Filters remove excluded and under-rated results
//! 4. Identity pass: skip results whose ids collide with an accepted one
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{DedupIndex, FilterPipeline};
//!
//! let filters = FilterPipeline::for_generation(request.min_rating);
//! let mut dedup = DedupIndex::new();
//!
//! if filters.admits(&result, &exclusions) && dedup.try_accept(&result) {
//!     accepted.push(result);
//! }
//! ```

pub mod dedup;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use dedup::DedupIndex;
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;

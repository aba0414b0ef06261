//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to enriched results.

use catalog::EnrichedResult;
use sources::ExclusionSet;

/// Core trait for filtering enriched results.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared across generation runs
/// - `keep` decides one result at a time, so the orchestrator can admit
///   results as they stream in
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Whether a single result passes this filter.
    ///
    /// # Arguments
    /// * `result` - The enriched result under consideration
    /// * `exclusions` - Titles the current run must not produce
    fn keep(&self, result: &EnrichedResult, exclusions: &ExclusionSet) -> bool;
}

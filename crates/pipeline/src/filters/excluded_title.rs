//! Filter to remove titles that already live in the collection lineage.
//!
//! The suggestion backend only treats the exclusion list as a hint, so
//! every enriched result is checked again here.

use crate::traits::Filter;
use catalog::EnrichedResult;
use sources::ExclusionSet;

/// Removes results whose title or ids appear in the exclusion set.
///
/// ## Algorithm
/// Uses the HashSets in ExclusionSet for O(1) lookups by normalized title,
/// then by TMDB / IMDb id.
pub struct ExcludedTitleFilter;

impl Filter for ExcludedTitleFilter {
    fn name(&self) -> &str {
        "ExcludedTitleFilter"
    }

    fn keep(&self, result: &EnrichedResult, exclusions: &ExclusionSet) -> bool {
        !exclusions.contains_result(result)
    }
}

//! Filter to ensure a minimum rating threshold.
//!
//! Removes results rated below the requested threshold, and results with
//! no rating at all: an unrated title cannot prove it clears the bar.

use crate::traits::Filter;
use catalog::EnrichedResult;
use sources::ExclusionSet;

/// Removes results below a rating threshold.
///
/// ## Algorithm
/// For each result:
/// 1. Take the metadata backend's rating (0-10 scale)
/// 2. Keep only if it is present and >= min_rating
pub struct MinimumRatingFilter {
    min_rating: f32,
}

impl MinimumRatingFilter {
    /// Create a new MinimumRatingFilter.
    ///
    /// # Arguments
    /// * `min_rating` - Minimum rating on the TMDB 0-10 scale
    pub fn new(min_rating: f32) -> Self {
        Self { min_rating }
    }
}

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn keep(&self, result: &EnrichedResult, _exclusions: &ExclusionSet) -> bool {
        result.rating.is_some_and(|rating| rating >= self.min_rating)
    }
}

//! Ordered composition of result filters.
//!
//! A generation run asks the pipeline about one result at a time as
//! enrichment results arrive.

use crate::filters::{ExcludedTitleFilter, MinimumRatingFilter};
use crate::traits::Filter;
use catalog::EnrichedResult;
use sources::ExclusionSet;
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(ExcludedTitleFilter)
///     .add_filter(MinimumRatingFilter::new(7.0));
///
/// if pipeline.admits(&result, &exclusions) { ... }
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The standard pipeline for a generation run: lineage exclusion, then
    /// the rating threshold when one is set.
    pub fn for_generation(min_rating: Option<f32>) -> Self {
        let pipeline = Self::new().add_filter(ExcludedTitleFilter);
        match min_rating {
            Some(threshold) => pipeline.add_filter(MinimumRatingFilter::new(threshold)),
            None => pipeline,
        }
    }

    /// Append a filter; filters run in the order they were added.
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether one result passes every filter.
    ///
    /// Stops at the first filter that rejects it.
    pub fn admits(&self, result: &EnrichedResult, exclusions: &ExclusionSet) -> bool {
        match self.filters.iter().find(|f| !f.keep(result, exclusions)) {
            Some(filter) => {
                debug!(filter = filter.name(), title = %result.key(), "Rejected result");
                false
            }
            None => true,
        }
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

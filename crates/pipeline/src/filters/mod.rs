//! Filter implementations for the generation pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod excluded_title;
pub mod minimum_rating;

// Re-export for convenience
pub use excluded_title::ExcludedTitleFilter;
pub use minimum_rating::MinimumRatingFilter;

//! # Catalog Crate
//!
//! Shared domain types for FlickVault collections and the generation
//! pipeline that expands them.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MediaType, Candidate, EnrichedResult, CollectionRecord)
//! - **normalize**: The one title normalization used by every caller (TitleKey, DedupKey)
//! - **index**: In-memory collection store backed by a JSON snapshot
//! - **store**: The read-only `CollectionStore` seam the generation core consumes
//! - **import**: Extract title entries from the JSON export formats we accept
//! - **error**: Error types for the catalog
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CollectionIndex, MediaType};
//! use std::path::Path;
//!
//! let mut index = CollectionIndex::load_or_default(Path::new("data/collections.json"))?;
//! let id = index.create_collection("Heist Movies", "", MediaType::Movie, None)?;
//! let titles = catalog::import::load_titles_from_file(Path::new("watchlist.json"))?;
//! let summary = index.add_members(id, MediaType::Movie, titles)?;
//! println!("Added {}, skipped {}", summary.added, summary.skipped);
//! ```

// Public modules
pub mod error;
pub mod import;
pub mod index;
pub mod normalize;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use index::CollectionIndex;
pub use normalize::{DedupKey, TitleKey, normalize_title};
pub use store::CollectionStore;
pub use types::{
    // Type aliases
    CollectionId,
    // Core types
    BatchSummary,
    Candidate,
    CollectionRecord,
    EnrichedResult,
    MemberTitle,
    // Enums
    MediaType,
};

//! Error types for the catalog crate.

use crate::types::{CollectionId, MediaType};
use thiserror::Error;

/// Errors that can occur while loading, saving or mutating collections
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Snapshot or import file could not be found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// File contents were not valid JSON, or not the shape we expected
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Referenced collection doesn't exist
    #[error("Collection {id} not found")]
    CollectionNotFound { id: CollectionId },

    /// A title batch was aimed at a collection of the other media type
    #[error("Cannot add a {found} to a {expected} collection")]
    MediaTypeMismatch { expected: MediaType, found: MediaType },

    /// Every candidate name for a new collection was already taken
    #[error("A collection named {name:?} already exists")]
    DuplicateName { name: String },

    /// A field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;

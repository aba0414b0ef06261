//! Core domain types for collections and generated titles.
//!
//! This module defines the data structures shared by the catalog, the
//! suggestion and enrichment clients, and the generation orchestrator.

use crate::error::CatalogError;
use crate::normalize::{DedupKey, TitleKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a collection
pub type CollectionId = i64;

// =============================================================================
// Enums
// =============================================================================

/// Kind of title a collection holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Show,
}

impl MediaType {
    /// Wire name ("movie" / "show")
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
        }
    }

    /// Human label used in prompts ("movie" / "TV show")
    pub fn item_label(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "TV show",
        }
    }

    /// Key of the items array in a generated collection document
    pub fn items_key(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::Show => "shows",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(MediaType::Movie),
            "show" | "shows" | "tv" => Ok(MediaType::Show),
            _ => Err(CatalogError::InvalidValue {
                field: "media_type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Generation Types
// =============================================================================

/// A title proposed by the suggestion backend.
///
/// Not yet trustworthy: it may duplicate an existing result, sit in the
/// exclusion set, or fail enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub year: Option<i32>,
    pub media_type: MediaType,
}

impl Candidate {
    pub fn new(title: impl Into<String>, year: Option<i32>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            year,
            media_type,
        }
    }

    pub fn key(&self) -> TitleKey {
        TitleKey::new(&self.title, self.year)
    }
}

/// A candidate after a successful metadata lookup.
///
/// This is the unit placed into the output sequence and handed to whoever
/// persists the expanded collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    pub title: String,
    pub year: Option<i32>,
    pub media_type: MediaType,
    /// TMDB id; the primary dedup key
    pub external_id: Option<String>,
    /// IMDb id; the fallback dedup key
    pub secondary_id: Option<String>,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub overview: String,
    pub rating: Option<f32>,
}

impl EnrichedResult {
    /// Start a result from a candidate with no metadata attached yet
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            title: candidate.title.clone(),
            year: candidate.year,
            media_type: candidate.media_type,
            external_id: None,
            secondary_id: None,
            poster_url: String::new(),
            overview: String::new(),
            rating: None,
        }
    }

    pub fn key(&self) -> TitleKey {
        TitleKey::new(&self.title, self.year)
    }

    /// The key that decides whether two results are the same title.
    ///
    /// Preference order: external id, then secondary id, then the
    /// normalized title+year.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::for_title(
            self.media_type,
            self.external_id.as_deref(),
            self.secondary_id.as_deref(),
            &self.title,
            self.year,
        )
    }

    /// Every identity this result can be recognised by.
    pub fn identity_keys(&self) -> Vec<DedupKey> {
        DedupKey::all_for_title(
            self.media_type,
            self.external_id.as_deref(),
            self.secondary_id.as_deref(),
            &self.title,
            self.year,
        )
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A title stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTitle {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub secondary_id: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl MemberTitle {
    pub fn new(title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            year,
            external_id: None,
            secondary_id: None,
            overview: String::new(),
            poster_url: String::new(),
            rating: None,
        }
    }

    pub fn key(&self) -> TitleKey {
        TitleKey::new(&self.title, self.year)
    }

    /// Members don't record their media type; it comes from the collection.
    pub fn identity_keys(&self, media_type: MediaType) -> Vec<DedupKey> {
        DedupKey::all_for_title(
            media_type,
            self.external_id.as_deref(),
            self.secondary_id.as_deref(),
            &self.title,
            self.year,
        )
    }
}

impl From<EnrichedResult> for MemberTitle {
    fn from(result: EnrichedResult) -> Self {
        Self {
            title: result.title,
            year: result.year,
            external_id: result.external_id,
            secondary_id: result.secondary_id,
            overview: result.overview,
            poster_url: result.poster_url,
            rating: result.rating,
        }
    }
}

/// A named collection, optionally nested under a parent collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub parent_id: Option<CollectionId>,
    #[serde(default)]
    pub members: Vec<MemberTitle>,
}

impl CollectionRecord {
    pub fn new(id: CollectionId, name: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            media_type,
            parent_id: None,
            members: Vec::new(),
        }
    }

    /// Builder-style parent assignment
    pub fn with_parent(mut self, parent_id: CollectionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Builder-style member list
    pub fn with_members(mut self, members: Vec<MemberTitle>) -> Self {
        self.members = members;
        self
    }
}

/// Outcome of adding a batch of titles to a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

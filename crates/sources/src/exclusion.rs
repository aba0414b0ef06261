//! Exclusion Set Builder - titles a generation run must never (re)suggest
//!
//! ## Algorithm
//! 1. Start at the source collection and follow `parent_id` up to the root
//! 2. Track visited ids; a repeat means the hierarchy is cyclic
//! 3. Bound the walk by a maximum depth as a second guard
//! 4. Union the members of every collection on the chain, normalized
//!
//! Membership is by normalized title only, so a suggestion that is off by a
//! year still cannot bring back a title that is already in the lineage.

use catalog::{
    CatalogError, CollectionId, CollectionRecord, CollectionStore, DedupKey, EnrichedResult,
    MediaType, MemberTitle, TitleKey, normalize_title,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Default bound on the lineage walk
pub const MAX_LINEAGE_DEPTH: usize = 64;

/// Why a lineage could not be resolved
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Collection {id} not found")]
    CollectionNotFound { id: CollectionId },

    #[error("Collection lineage is cyclic: collection {id} is its own ancestor (chain: {chain:?})")]
    Cycle {
        id: CollectionId,
        chain: Vec<CollectionId>,
    },

    #[error("Collection {id} points at missing parent {parent}")]
    DanglingParent {
        id: CollectionId,
        parent: CollectionId,
    },

    #[error("Collection lineage exceeds {max_depth} levels")]
    TooDeep { max_depth: usize },

    #[error("Collection store error: {0}")]
    Store(#[from] CatalogError),
}

impl LineageError {
    /// Whether this error means the stored hierarchy itself is broken
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            LineageError::Cycle { .. } | LineageError::DanglingParent { .. } | LineageError::TooDeep { .. }
        )
    }
}

/// Titles gathered from a collection's full ancestor chain.
///
/// Built once per run and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    /// Normalized titles
    titles: HashSet<String>,
    /// External / secondary ids of lineage members; external ids carry the
    /// media type of the collection they were stored in
    ids: HashSet<DedupKey>,
    /// Original spelling of each title, first occurrence wins
    display_titles: Vec<String>,
    /// Collection ids from the source collection up to the root
    lineage: Vec<CollectionId>,
}

impl ExclusionSet {
    /// Exclusion set for a run with no source collection
    pub fn empty() -> Self {
        Self::default()
    }

    /// Union the members of an already resolved lineage
    pub fn from_lineage(lineage: &[CollectionRecord]) -> Self {
        let members: Vec<(MediaType, &MemberTitle)> = lineage
            .iter()
            .flat_map(|c| c.members.iter().map(move |m| (c.media_type, m)))
            .collect();

        let titles: HashSet<String> = members
            .par_iter()
            .map(|(_, m)| normalize_title(&m.title))
            .filter(|t| !t.is_empty())
            .collect();

        let ids: HashSet<DedupKey> = members
            .par_iter()
            .flat_map_iter(|(media_type, m)| m.identity_keys(*media_type))
            .filter(|k| !matches!(k, DedupKey::Title(_)))
            .collect();

        let mut seen = HashSet::with_capacity(titles.len());
        let display_titles = members
            .iter()
            .filter(|(_, m)| {
                let normalized = normalize_title(&m.title);
                !normalized.is_empty() && seen.insert(normalized)
            })
            .map(|(_, m)| m.title.trim().to_string())
            .collect();

        Self {
            titles,
            ids,
            display_titles,
            lineage: lineage.iter().map(|c| c.id).collect(),
        }
    }

    /// Whether a raw title is excluded
    pub fn contains_title(&self, title: &str) -> bool {
        self.titles.contains(&normalize_title(title))
    }

    /// Whether a title key is excluded (the year is ignored)
    pub fn contains_key(&self, key: &TitleKey) -> bool {
        self.titles.contains(&key.title)
    }

    /// Whether an enriched result matches a lineage member by title or id
    pub fn contains_result(&self, result: &EnrichedResult) -> bool {
        self.contains_title(&result.title)
            || result.identity_keys().iter().any(|k| self.ids.contains(k))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Member titles as originally spelled, for the suggestion prompt
    pub fn display_titles(&self) -> &[String] {
        &self.display_titles
    }

    /// Normalized titles, sorted
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.titles.iter().map(String::as_str).collect();
        titles.sort_unstable();
        titles
    }

    /// Collection ids walked, starting with the source collection
    pub fn lineage(&self) -> &[CollectionId] {
        &self.lineage
    }
}

/// Computes exclusion sets by walking the collection hierarchy
#[derive(Clone)]
pub struct ExclusionSetBuilder {
    store: Arc<dyn CollectionStore>,
    max_depth: usize,
}

impl ExclusionSetBuilder {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self {
            store,
            max_depth: MAX_LINEAGE_DEPTH,
        }
    }

    /// Configure the maximum lineage depth (default: 64)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Build the exclusion set for an optional source collection
    #[instrument(skip(self))]
    pub async fn build(
        &self,
        collection_id: Option<CollectionId>,
    ) -> Result<ExclusionSet, LineageError> {
        let Some(id) = collection_id else {
            return Ok(ExclusionSet::empty());
        };

        let lineage = self.resolve_lineage(id).await?;
        let set = ExclusionSet::from_lineage(&lineage);

        debug!(
            depth = lineage.len(),
            titles = set.len(),
            ids = set.ids.len(),
            "Built exclusion set"
        );
        Ok(set)
    }

    /// Fetch the collection and all of its ancestors, nearest first
    pub async fn resolve_lineage(
        &self,
        id: CollectionId,
    ) -> Result<Vec<CollectionRecord>, LineageError> {
        let mut chain: Vec<CollectionRecord> = Vec::new();
        let mut visited: HashSet<CollectionId> = HashSet::new();
        let mut current = id;

        loop {
            if !visited.insert(current) {
                let chain: Vec<CollectionId> = chain.iter().map(|c| c.id).collect();
                warn!(id = current, ?chain, "Cyclic collection lineage");
                return Err(LineageError::Cycle { id: current, chain });
            }
            if chain.len() >= self.max_depth {
                warn!(max_depth = self.max_depth, "Collection lineage too deep");
                return Err(LineageError::TooDeep {
                    max_depth: self.max_depth,
                });
            }

            let record = match self.store.get_collection(current).await? {
                Some(record) => record,
                None => {
                    return Err(match chain.last() {
                        None => LineageError::CollectionNotFound { id: current },
                        Some(child) => LineageError::DanglingParent {
                            id: child.id,
                            parent: current,
                        },
                    });
                }
            };

            let parent = record.parent_id;
            chain.push(record);
            match parent {
                Some(parent) => current = parent,
                None => return Ok(chain),
            }
        }
    }
}

//! CollectionIndex building, persistence and mutation.
//!
//! The index keeps every collection in a `BTreeMap` keyed by id and is
//! loaded from / saved to a single JSON snapshot file.

use crate::error::{CatalogError, Result};
use crate::normalize::DedupKey;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// How many suffixed names to try before giving up on a new collection name
const MAX_NAME_ATTEMPTS: usize = 20;

/// On-disk snapshot layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    collections: Vec<CollectionRecord>,
}

/// In-memory collection store
#[derive(Debug, Clone)]
pub struct CollectionIndex {
    collections: BTreeMap<CollectionId, CollectionRecord>,
    next_id: CollectionId,
}

impl CollectionIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            collections: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Load an index from a snapshot file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CatalogError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let raw = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;

        let mut index = CollectionIndex::new();
        for record in snapshot.collections {
            index.insert(record);
        }

        info!(
            path = %path.display(),
            collections = index.len(),
            "Loaded collection snapshot"
        );
        Ok(index)
    }

    /// Load a snapshot, or start empty when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load_from_file(path) {
            Err(CatalogError::FileNotFound { .. }) => {
                debug!(path = %path.display(), "No snapshot yet, starting empty");
                Ok(Self::new())
            }
            other => other,
        }
    }

    /// Write the index to a snapshot file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let snapshot = Snapshot {
            collections: self.collections.values().cloned().collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        debug!(path = %path.display(), collections = self.len(), "Saved collection snapshot");
        Ok(())
    }

    /// Insert or replace a collection record
    pub fn insert(&mut self, record: CollectionRecord) {
        self.next_id = self.next_id.max(record.id + 1);
        self.collections.insert(record.id, record);
    }

    pub fn get(&self, id: CollectionId) -> Option<&CollectionRecord> {
        self.collections.get(&id)
    }

    /// Find a collection by exact name
    pub fn get_by_name(&self, name: &str) -> Option<&CollectionRecord> {
        self.collections.values().find(|c| c.name == name)
    }

    /// Direct children of a collection, ordered by id
    pub fn children(&self, id: CollectionId) -> Vec<&CollectionRecord> {
        self.collections
            .values()
            .filter(|c| c.parent_id == Some(id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionRecord> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Create a new collection under a unique name.
    ///
    /// If `name` is taken, tries `"name (2)"`, `"name (3)"`, ... and fails
    /// with `DuplicateName` after a bounded number of attempts.
    pub fn create_collection(
        &mut self,
        name: &str,
        description: &str,
        media_type: MediaType,
        parent_id: Option<CollectionId>,
    ) -> Result<CollectionId> {
        if let Some(parent) = parent_id {
            if !self.collections.contains_key(&parent) {
                return Err(CatalogError::CollectionNotFound { id: parent });
            }
        }

        let base = name.trim();
        if base.is_empty() {
            return Err(CatalogError::InvalidValue {
                field: "name".to_string(),
                value: name.to_string(),
            });
        }

        let unique_name = (0..MAX_NAME_ATTEMPTS)
            .map(|attempt| match attempt {
                0 => base.to_string(),
                n => format!("{} ({})", base, n + 1),
            })
            .find(|candidate| self.get_by_name(candidate).is_none())
            .ok_or_else(|| CatalogError::DuplicateName {
                name: base.to_string(),
            })?;

        let id = self.next_id;
        let mut record = CollectionRecord::new(id, unique_name, media_type);
        record.description = description.to_string();
        record.parent_id = parent_id;
        self.insert(record);

        info!(id, parent = ?parent_id, "Created collection");
        Ok(id)
    }

    /// Add a batch of titles to a collection.
    ///
    /// Titles already present (by external id, secondary id or title key)
    /// are skipped, as are duplicates within the batch itself.
    pub fn add_members(
        &mut self,
        id: CollectionId,
        media_type: MediaType,
        titles: Vec<MemberTitle>,
    ) -> Result<BatchSummary> {
        let collection = self
            .collections
            .get_mut(&id)
            .ok_or(CatalogError::CollectionNotFound { id })?;

        if collection.media_type != media_type {
            return Err(CatalogError::MediaTypeMismatch {
                expected: collection.media_type,
                found: media_type,
            });
        }

        let mut known: HashSet<DedupKey> = collection
            .members
            .iter()
            .flat_map(|m| m.identity_keys(media_type))
            .collect();

        let mut summary = BatchSummary {
            total: titles.len(),
            ..Default::default()
        };

        for title in titles {
            let keys = title.identity_keys(media_type);
            if keys.iter().any(|k| known.contains(k)) {
                summary.skipped += 1;
                continue;
            }
            known.extend(keys);
            collection.members.push(title);
            summary.added += 1;
        }

        debug!(
            id,
            added = summary.added,
            skipped = summary.skipped,
            "Added batch to collection"
        );
        Ok(summary)
    }
}

impl Default for CollectionIndex {
    fn default() -> Self {
        Self::new()
    }
}

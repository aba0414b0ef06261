//! Title normalization and dedup keys.
//!
//! Every component that compares titles (the exclusion set builder, the
//! orchestrator's dedup passes, the bulk importer, the CLI) goes through
//! these helpers so they always agree on what "the same title" means.

use crate::types::MediaType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-fold a title and collapse its whitespace.
///
/// `"  The  Thing "` and `"the thing"` normalize to the same string.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized title plus optional release year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TitleKey {
    pub title: String,
    pub year: Option<i32>,
}

impl TitleKey {
    pub fn new(title: &str, year: Option<i32>) -> Self {
        Self {
            title: normalize_title(title),
            year,
        }
    }

    /// Same title with the year dropped
    pub fn without_year(&self) -> Self {
        Self {
            title: self.title.clone(),
            year: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
    }
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => f.write_str(&self.title),
        }
    }
}

/// Identity used to decide that two results represent the same title.
///
/// TMDB numbers movies and TV shows independently, so an external id is
/// only meaningful together with its media type. IMDb ids are global.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DedupKey {
    External { media_type: MediaType, id: String },
    Secondary(String),
    Title(TitleKey),
}

impl DedupKey {
    /// Preferred key: external id, else secondary id, else title+year.
    pub fn for_title(
        media_type: MediaType,
        external_id: Option<&str>,
        secondary_id: Option<&str>,
        title: &str,
        year: Option<i32>,
    ) -> Self {
        if let Some(id) = non_blank(external_id) {
            return DedupKey::External {
                media_type,
                id: id.to_string(),
            };
        }
        if let Some(id) = non_blank(secondary_id) {
            return DedupKey::Secondary(id.to_string());
        }
        DedupKey::Title(TitleKey::new(title, year))
    }

    /// All keys available for a title, in preference order.
    pub fn all_for_title(
        media_type: MediaType,
        external_id: Option<&str>,
        secondary_id: Option<&str>,
        title: &str,
        year: Option<i32>,
    ) -> Vec<Self> {
        let mut keys = Vec::with_capacity(3);
        if let Some(id) = non_blank(external_id) {
            keys.push(DedupKey::External {
                media_type,
                id: id.to_string(),
            });
        }
        if let Some(id) = non_blank(secondary_id) {
            keys.push(DedupKey::Secondary(id.to_string()));
        }
        keys.push(DedupKey::Title(TitleKey::new(title, year)));
        keys
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

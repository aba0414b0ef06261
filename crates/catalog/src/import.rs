//! Extraction of title entries from JSON exports.
//!
//! Accepted shapes:
//! - a plain array of title objects
//! - an object with any of `already_added`, `remaining`, `movies` arrays
//!   (a Trakt watchlist export), concatenated in that order
//! - a single title object
//!
//! Entries are normalized into [`MemberTitle`]s: non-objects are skipped,
//! a missing title becomes `"Unknown"`, identifier fields are stringified.

use crate::error::{CatalogError, Result};
use crate::types::MemberTitle;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Array keys checked on a wrapper object, in order
const LIST_KEYS: [&str; 3] = ["already_added", "remaining", "movies"];

/// Read and extract titles from a JSON file
pub fn load_titles_from_file(path: &Path) -> Result<Vec<MemberTitle>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    let titles = extract_titles(&value);
    debug!(path = %path.display(), titles = titles.len(), "Extracted titles from file");
    Ok(titles)
}

/// Extract title entries from any accepted JSON shape.
pub fn extract_titles(value: &Value) -> Vec<MemberTitle> {
    match value {
        Value::Array(items) => normalize_entries(items),
        Value::Object(object) => {
            let items: Vec<Value> = LIST_KEYS
                .iter()
                .filter_map(|key| object.get(*key).and_then(Value::as_array))
                .flatten()
                .cloned()
                .collect();

            if !items.is_empty() {
                normalize_entries(&items)
            } else if object.contains_key("title") {
                normalize_entries(std::slice::from_ref(value))
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Normalize raw entries in parallel, preserving input order
fn normalize_entries(items: &[Value]) -> Vec<MemberTitle> {
    items
        .par_iter()
        .filter_map(|item| item.as_object().map(normalize_entry))
        .collect()
}

fn normalize_entry(object: &Map<String, Value>) -> MemberTitle {
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown");

    let year = object.get("year").and_then(as_year);

    let mut member = MemberTitle::new(title, year);
    member.external_id = object.get("tmdb_id").and_then(stringify);
    member.secondary_id = object.get("imdb_id").and_then(stringify);
    member.overview = object.get("overview").and_then(stringify).unwrap_or_default();
    member.poster_url = object.get("poster_url").and_then(stringify).unwrap_or_default();
    member.rating = object.get("rating").and_then(as_rating);
    member
}

/// Render an id-like field as a string; null and blank values are absent
fn stringify(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn as_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_rating(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|r| r as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

//! Wire types for the subset of the TMDB v3 API we call.

use catalog::normalize_title;
use serde::Deserialize;

/// `GET /search/movie` and `GET /search/tv` response
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) results: Vec<SearchHit>,
}

/// One search result. Movies carry `title`, TV shows carry `name`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchHit {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) original_title: Option<String>,
    #[serde(default)]
    pub(crate) original_name: Option<String>,
    #[serde(default)]
    pub(crate) poster_path: Option<String>,
    #[serde(default)]
    pub(crate) overview: Option<String>,
    #[serde(default)]
    pub(crate) vote_average: Option<f64>,
}

impl SearchHit {
    /// Whether any of the hit's titles normalizes to `normalized`
    pub(crate) fn matches_title(&self, normalized: &str) -> bool {
        [&self.title, &self.name, &self.original_title, &self.original_name]
            .into_iter()
            .flatten()
            .any(|t| normalize_title(t) == normalized)
    }

    /// Vote average rounded to one decimal; zero means "no votes"
    pub(crate) fn rating(&self) -> Option<f32> {
        self.vote_average
            .filter(|v| *v > 0.0)
            .map(|v| ((v * 10.0).round() / 10.0) as f32)
    }
}

/// `GET /{movie|tv}/{id}/external_ids` response
#[derive(Debug, Deserialize)]
pub(crate) struct ExternalIds {
    #[serde(default)]
    pub(crate) imdb_id: Option<String>,
}

/// Pick the best hit for a title: an exact normalized title match if one
/// exists, otherwise the top-ranked result.
pub(crate) fn pick_match<'a>(hits: &'a [SearchHit], title: &str) -> Option<&'a SearchHit> {
    let wanted = normalize_title(title);
    hits.iter()
        .find(|hit| hit.matches_title(&wanted))
        .or_else(|| hits.first())
}

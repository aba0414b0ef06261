//! The suggestion seam: ask a language model for candidate titles.
//!
//! A [`SuggestionSource`] turns a natural-language prompt into a bounded
//! list of [`Candidate`]s. It never retries on its own; the orchestrator's
//! round loop decides whether to ask again.

use async_trait::async_trait;
use catalog::{Candidate, MediaType};
use serde_json::Value;
use thiserror::Error;

/// Errors a suggestion backend can report
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("Suggestion backend unreachable: {0}")]
    Unavailable(String),

    #[error("Suggestion backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Suggestion backend returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// What one round asks the backend for
#[derive(Debug, Clone, Copy)]
pub struct SuggestionRequest<'a> {
    pub prompt: &'a str,
    pub media_type: MediaType,
    /// How many titles to ask for (already inflated for attrition)
    pub count_hint: usize,
    pub min_rating: Option<f32>,
    /// Titles the backend should avoid; best effort only
    pub excluded_titles: &'a [String],
}

/// One backend response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionBatch {
    /// Collection name proposed by the backend, if any
    pub name: Option<String>,
    pub description: Option<String>,
    pub candidates: Vec<Candidate>,
}

/// Anything that can propose candidate titles for a prompt.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Returns the name of this source (for logging)
    fn name(&self) -> &str;

    async fn suggest(
        &self,
        request: &SuggestionRequest<'_>,
    ) -> Result<SuggestionBatch, SuggestionError>;
}

/// Longest exclusion list we spell out in a prompt
const MAX_EXCLUDED_IN_PROMPT: usize = 200;

/// System prompt describing the JSON document we expect back.
pub fn system_prompt(media_type: MediaType, min_rating: Option<f32>) -> String {
    let label = media_type.item_label();
    let key = media_type.items_key();
    let title_label = match media_type {
        MediaType::Movie => "Movie",
        MediaType::Show => "TV Show",
    };

    let rating_rule = match min_rating {
        Some(rating) => format!(
            "\n- Only include {label}s with a strong reputation: aim for titles generally rated {rating}+ on TMDB/IMDb"
        ),
        None => String::new(),
    };

    format!(
        r#"You are a {label} expert. The user will describe a {label} collection they want.
Return a JSON object with exactly this structure:
{{
  "name": "Collection Name",
  "description": "A brief description of the collection",
  "{key}": [
    {{"title": "{title_label} Title", "year": 1999}},
    ...
  ]
}}

Rules:
- Return ONLY valid JSON, no markdown fences, no extra text
- The "{key}" array must contain exactly the number of {label}s requested
- Each {label} must have "title" (string) and "year" (integer)
- Only include real, well-known {label}s that match the user's request
- Never include a title the user lists as excluded
- Order {label}s by relevance to the prompt{rating_rule}"#
    )
}

/// User message: the prompt, the requested count and the exclusion list.
pub fn user_message(request: &SuggestionRequest<'_>) -> String {
    let plural = format!("{}s", request.media_type.item_label());
    let mut message = format!(
        "{}\n\nPlease return exactly {} {}.",
        request.prompt.trim(),
        request.count_hint,
        plural
    );

    if !request.excluded_titles.is_empty() {
        message.push_str(&format!(
            "\n\nDo not include any of these {} (already in the collection or already suggested):",
            plural
        ));
        for title in request.excluded_titles.iter().take(MAX_EXCLUDED_IN_PROMPT) {
            message.push_str("\n- ");
            message.push_str(title);
        }
    }
    message
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a generated collection document into a batch.
///
/// Accepts the media type's own items key or `"movies"`; items without a
/// non-empty title are dropped.
pub fn parse_batch(raw: &str, media_type: MediaType) -> Result<SuggestionBatch, SuggestionError> {
    let document: Value = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| SuggestionError::InvalidResponse(format!("invalid JSON: {}", e)))?;

    let items = document
        .get(media_type.items_key())
        .or_else(|| document.get("movies"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SuggestionError::InvalidResponse(format!(
                "response is missing the \"{}\" array",
                media_type.items_key()
            ))
        })?;

    let candidates = items
        .iter()
        .filter_map(|item| {
            let title = item.get("title")?.as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            let year = item.get("year").and_then(|y| match y {
                Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            });
            Some(Candidate::new(title, year, media_type))
        })
        .collect();

    let text = |key: &str| {
        document
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(SuggestionBatch {
        name: text("name"),
        description: text("description"),
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[]\n```  "), "[]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_batch() {
        let raw = r#"```json
{
  "name": "Heat Wave",
  "description": "Crime in the city",
  "movies": [
    {"title": "Heat", "year": 1995},
    {"title": "  ", "year": 2000},
    {"title": "Thief", "year": "1981"},
    {"year": 1990},
    {"title": "Collateral"}
  ]
}
```"#;

        let batch = parse_batch(raw, MediaType::Movie).unwrap();
        assert_eq!(batch.name.as_deref(), Some("Heat Wave"));
        assert_eq!(batch.description.as_deref(), Some("Crime in the city"));
        assert_eq!(
            batch.candidates,
            vec![
                Candidate::new("Heat", Some(1995), MediaType::Movie),
                Candidate::new("Thief", Some(1981), MediaType::Movie),
                Candidate::new("Collateral", None, MediaType::Movie),
            ]
        );
    }

    #[test]
    fn test_parse_batch_for_shows() {
        let raw = r#"{"name": "Prestige TV", "shows": [{"title": "The Wire", "year": 2002}]}"#;
        let batch = parse_batch(raw, MediaType::Show).unwrap();
        assert_eq!(batch.candidates[0].media_type, MediaType::Show);
        assert!(batch.description.is_none());
    }

    #[test]
    fn test_parse_batch_rejects_bad_documents() {
        assert!(matches!(
            parse_batch("not json", MediaType::Movie),
            Err(SuggestionError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_batch(r#"{"name": "x"}"#, MediaType::Movie),
            Err(SuggestionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_user_message_lists_exclusions() {
        let excluded = vec!["Heat".to_string(), "Ronin".to_string()];
        let request = SuggestionRequest {
            prompt: "  90s crime movies ",
            media_type: MediaType::Movie,
            count_hint: 8,
            min_rating: None,
            excluded_titles: &excluded,
        };

        let message = user_message(&request);
        assert!(message.starts_with("90s crime movies\n\nPlease return exactly 8 movies."));
        assert!(message.contains("\n- Heat\n- Ronin"));
    }

    #[test]
    fn test_system_prompt_rating_rule() {
        assert!(!system_prompt(MediaType::Movie, None).contains("rated"));
        let prompt = system_prompt(MediaType::Show, Some(8.0));
        assert!(prompt.contains("\"shows\""));
        assert!(prompt.contains("rated 8+"));
    }
}

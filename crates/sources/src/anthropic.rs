//! Anthropic Source - LLM-backed candidate suggestions
//!
//! Asks Claude (Messages API) for a collection document and parses the
//! candidate titles out of it.
//!
//! ## Algorithm
//! 1. Build a system prompt describing the JSON document we want
//! 2. Send the user's prompt, the count hint and the exclusion list
//! 3. Strip any markdown fence from the reply and parse the document
//! 4. Return the candidates in the order the model ranked them

use crate::suggestion::{
    SuggestionBatch, SuggestionError, SuggestionRequest, SuggestionSource, parse_batch,
    system_prompt, user_message,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Anthropic model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// Anthropic source generates candidates from a natural-language prompt
#[derive(Debug, Clone)]
pub struct AnthropicSource {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicSource {
    /// Create a new Anthropic source with the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self, SuggestionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SuggestionError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 2048,
        })
    }

    /// Configure the model (default: claude-sonnet-4-5)
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Configure the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Configure the response token budget (default: 2048)
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_api(&self, system: &str, user: &str) -> Result<String, SuggestionError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": &self.model,
                "max_tokens": self.max_tokens,
                "system": system,
                "messages": [{"role": "user", "content": user}]
            }))
            .send()
            .await
            .map_err(|e| SuggestionError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestionError::Status { status, body });
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| SuggestionError::InvalidResponse(e.to_string()))?;

        api_response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| SuggestionError::InvalidResponse("empty response".to_string()))
    }
}

#[async_trait]
impl SuggestionSource for AnthropicSource {
    fn name(&self) -> &str {
        "Anthropic"
    }

    #[instrument(skip(self, request), fields(count_hint = request.count_hint, excluded = request.excluded_titles.len()))]
    async fn suggest(
        &self,
        request: &SuggestionRequest<'_>,
    ) -> Result<SuggestionBatch, SuggestionError> {
        let system = system_prompt(request.media_type, request.min_rating);
        let user = user_message(request);

        let raw = self.call_api(&system, &user).await?;
        let batch = parse_batch(&raw, request.media_type)?;

        debug!(
            model = %self.model,
            candidates = batch.candidates.len(),
            "Received suggestions"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Candidate, MediaType};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request<'a>(excluded: &'a [String]) -> SuggestionRequest<'a> {
        SuggestionRequest {
            prompt: "heist movies",
            media_type: MediaType::Movie,
            count_hint: 3,
            min_rating: Some(7.0),
            excluded_titles: excluded,
        }
    }

    #[test]
    fn test_new_source() {
        let source = AnthropicSource::new("test-key").unwrap();
        assert_eq!(source.model(), DEFAULT_MODEL);
        assert_eq!(source.name(), "Anthropic");

        let source = source.with_model("claude-3-opus");
        assert_eq!(source.model(), "claude-3-opus");
    }

    #[tokio::test]
    async fn test_suggest_parses_fenced_reply() {
        let server = MockServer::start().await;
        let document = "```json\n{\"name\": \"Heists\", \"movies\": [{\"title\": \"Heat\", \"year\": 1995}, {\"title\": \"Rififi\", \"year\": 1955}]}\n```";
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": document}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = AnthropicSource::new("test-key").unwrap().with_base_url(server.uri());
        let excluded = vec!["Thief".to_string()];
        let batch = source.suggest(&request(&excluded)).await.unwrap();

        assert_eq!(batch.name.as_deref(), Some("Heists"));
        assert_eq!(
            batch.candidates,
            vec![
                Candidate::new("Heat", Some(1995), MediaType::Movie),
                Candidate::new("Rififi", Some(1955), MediaType::Movie),
            ]
        );

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let user = body["messages"][0]["content"].as_str().unwrap();
        assert!(user.contains("Please return exactly 3 movies."));
        assert!(user.contains("- Thief"));
        assert!(body["system"].as_str().unwrap().contains("rated 7+"));
    }

    #[tokio::test]
    async fn test_suggest_reports_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let source = AnthropicSource::new("test-key").unwrap().with_base_url(server.uri());
        let err = source.suggest(&request(&[])).await.unwrap_err();

        assert!(matches!(err, SuggestionError::Status { status: 529, ref body } if body == "overloaded"));
    }

    #[tokio::test]
    async fn test_suggest_rejects_unparseable_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Sure! Here are some heist movies..."}]
            })))
            .mount(&server)
            .await;

        let source = AnthropicSource::new("test-key").unwrap().with_base_url(server.uri());
        let err = source.suggest(&request(&[])).await.unwrap_err();

        assert!(matches!(err, SuggestionError::InvalidResponse(_)));
    }
}

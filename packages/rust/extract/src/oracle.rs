//! The semantic extractor boundary.
//!
//! The pipeline hands each page to a [`SemanticExtractor`] and gets back an
//! [`ExtractionOutcome`]. Implementations report problems as
//! [`ExtractionOutcome::Failure`] instead of erroring, so the caller only ever
//! branches on three cases.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use sitescout_shared::{AppConfig, ExtractionResult, Result, SiteScoutError};

/// User-Agent string for extractor requests.
const USER_AGENT: &str = concat!("SiteScout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait + outcome
// ---------------------------------------------------------------------------

/// What the extractor made of one page.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// At least one bucket has fragments.
    Success(ExtractionResult),
    /// The extractor ran but found nothing.
    Empty,
    /// The extractor could not produce a usable answer.
    Failure(String),
}

impl ExtractionOutcome {
    /// `Success` unless every bucket is empty.
    pub fn from_result(result: ExtractionResult) -> Self {
        if result.is_empty() {
            Self::Empty
        } else {
            Self::Success(result)
        }
    }

    /// Number of founder fragments the extractor returned.
    pub fn founder_count(&self) -> usize {
        match self {
            Self::Success(result) => result.founders.len(),
            Self::Empty | Self::Failure(_) => 0,
        }
    }
}

/// Turns a page into categorized fragments.
#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    /// Extract products, services and founders from one page.
    async fn extract(&self, url: &str, page_text: &str) -> ExtractionOutcome;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

/// Extractor that never finds anything, leaving founders to the keyword fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

#[async_trait]
impl SemanticExtractor for NoopExtractor {
    async fn extract(&self, _url: &str, _page_text: &str) -> ExtractionOutcome {
        ExtractionOutcome::Empty
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// ---------------------------------------------------------------------------
// OpenRouter (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

/// Settings for [`OpenRouterExtractor`].
#[derive(Debug, Clone)]
pub struct OpenRouterOptions {
    pub api_key: String,
    pub model: String,
    /// API root, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Fixed instruction sent as the system message.
    pub prompt: String,
    /// Page text beyond this many characters is cut off.
    pub max_content_chars: usize,
    pub timeout: Duration,
}

impl OpenRouterOptions {
    /// Build options from the app config and an already-resolved API key.
    pub fn from_config(config: &AppConfig, api_key: String) -> Self {
        Self {
            api_key,
            model: config.openrouter.default_model.clone(),
            base_url: config.openrouter.base_url.clone(),
            prompt: config.extraction.prompt.clone(),
            max_content_chars: config.extraction.max_content_chars,
            timeout: Duration::from_secs(config.defaults.extract_timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Extractor backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterExtractor {
    client: Client,
    endpoint: String,
    opts: OpenRouterOptions,
}

impl OpenRouterExtractor {
    pub fn new(opts: OpenRouterOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| SiteScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!("{}/chat/completions", opts.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            opts,
        })
    }

    async fn request(&self, url: &str, page_text: &str) -> Result<ExtractionResult> {
        let request = ChatRequest {
            model: &self.opts.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.opts.prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Page URL: {url}\n\nPage content:\n{}",
                        truncate_content(page_text, self.opts.max_content_chars)
                    ),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.opts.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SiteScoutError::Extraction(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteScoutError::Extraction(format!("HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SiteScoutError::Extraction(format!("invalid response body: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SiteScoutError::Extraction("response had no choices".into()))?
            .message
            .content
            .unwrap_or_default();

        parse_reply(&content)
    }
}

#[async_trait]
impl SemanticExtractor for OpenRouterExtractor {
    #[instrument(skip_all, fields(url = %url, model = %self.opts.model))]
    async fn extract(&self, url: &str, page_text: &str) -> ExtractionOutcome {
        match self.request(url, page_text).await {
            Ok(result) => {
                debug!(
                    products = result.products.len(),
                    services = result.services.len(),
                    founders = result.founders.len(),
                    "extractor replied"
                );
                ExtractionOutcome::from_result(result)
            }
            Err(e) => ExtractionOutcome::Failure(e.to_string()),
        }
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

/// Parse the assistant message into buckets.
///
/// Models sometimes wrap JSON in a Markdown code fence; that is tolerated.
/// A blank reply or `null` counts as an empty result.
fn parse_reply(content: &str) -> Result<ExtractionResult> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Ok(ExtractionResult::default());
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| SiteScoutError::parse(format!("reply is not JSON: {e}")))?;

    match value {
        Value::Null => Ok(ExtractionResult::default()),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| SiteScoutError::parse(format!("unexpected reply shape: {e}"))),
        other => Err(SiteScoutError::parse(format!(
            "expected a JSON object, got: {}",
            truncate_content(&other.to_string(), 80)
        ))),
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Cut `content` to at most `max_chars` characters.
fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\n\n[... content truncated ...]", &content[..idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitescout_shared::Fragment;

    fn options(base_url: &str) -> OpenRouterOptions {
        OpenRouterOptions {
            api_key: "test-key".into(),
            model: "test/model".into(),
            base_url: base_url.into(),
            prompt: "Extract things.".into(),
            max_content_chars: 1_000,
            timeout: Duration::from_secs(5),
        }
    }

    fn chat_body(content: &str) -> Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    async fn mount_reply(server: &wiremock::MockServer, template: wiremock::ResponseTemplate) {
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer test-key"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn outcome_from_empty_result_is_empty() {
        assert_eq!(
            ExtractionOutcome::from_result(ExtractionResult::default()),
            ExtractionOutcome::Empty
        );
        assert_eq!(ExtractionOutcome::Failure("x".into()).founder_count(), 0);
    }

    #[test]
    fn parse_reply_handles_code_fence() {
        let reply = "```json\n{\"products\": [\"Widget\"]}\n```";
        let result = parse_reply(reply).unwrap();
        assert_eq!(result.products, vec![Fragment::from("Widget")]);
    }

    #[test]
    fn parse_reply_rejects_non_objects() {
        assert!(matches!(
            parse_reply("[1, 2, 3]"),
            Err(SiteScoutError::Parse { .. })
        ));
        assert!(matches!(
            parse_reply("not json"),
            Err(SiteScoutError::Parse { .. })
        ));
        assert!(parse_reply("null").unwrap().is_empty());
        assert!(parse_reply("   ").unwrap().is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_content("short", 100), "short");
        let cut = truncate_content("ääääää", 3);
        assert!(cut.starts_with("äää\n"));
        assert!(cut.contains("truncated"));
    }

    #[tokio::test]
    async fn extract_success() {
        let server = wiremock::MockServer::start().await;
        let reply = r#"{"products": ["Tonestro App"], "services": [], "founders": [{"name": "Jane Doe", "age": 30}]}"#;
        mount_reply(
            &server,
            wiremock::ResponseTemplate::new(200).set_body_json(chat_body(reply)),
        )
        .await;

        let extractor = OpenRouterExtractor::new(options(&server.uri())).unwrap();
        let outcome = extractor.extract("https://tonestro.com/", "page text").await;

        match outcome {
            ExtractionOutcome::Success(result) => {
                assert_eq!(result.products, vec![Fragment::from("Tonestro App")]);
                assert_eq!(result.founders.len(), 1);
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_all_empty_is_empty() {
        let server = wiremock::MockServer::start().await;
        let reply = r#"{"products": [], "services": [], "founders": []}"#;
        mount_reply(
            &server,
            wiremock::ResponseTemplate::new(200).set_body_json(chat_body(reply)),
        )
        .await;

        let extractor = OpenRouterExtractor::new(options(&server.uri())).unwrap();
        let outcome = extractor.extract("https://kokoon.io/", "text").await;
        assert_eq!(outcome, ExtractionOutcome::Empty);
    }

    #[tokio::test]
    async fn extract_http_error_is_failure() {
        let server = wiremock::MockServer::start().await;
        mount_reply(&server, wiremock::ResponseTemplate::new(429)).await;

        let extractor = OpenRouterExtractor::new(options(&server.uri())).unwrap();
        let outcome = extractor.extract("https://kokoon.io/", "text").await;
        match outcome {
            ExtractionOutcome::Failure(cause) => assert!(cause.contains("429")),
            other => panic!("expected Failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_without_choices_is_failure() {
        let server = wiremock::MockServer::start().await;
        mount_reply(
            &server,
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
        )
        .await;

        let extractor = OpenRouterExtractor::new(options(&server.uri())).unwrap();
        let outcome = extractor.extract("https://kokoon.io/", "text").await;
        match outcome {
            ExtractionOutcome::Failure(cause) => assert!(cause.contains("no choices")),
            other => panic!("expected Failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_malformed_reply_is_failure() {
        let server = wiremock::MockServer::start().await;
        mount_reply(
            &server,
            wiremock::ResponseTemplate::new(200).set_body_json(chat_body("Sorry, I can't help.")),
        )
        .await;

        let extractor = OpenRouterExtractor::new(options(&server.uri())).unwrap();
        let outcome = extractor.extract("https://kokoon.io/", "text").await;
        assert!(matches!(outcome, ExtractionOutcome::Failure(_)));
    }

    #[tokio::test]
    async fn noop_extractor_is_always_empty() {
        let outcome = NoopExtractor.extract("https://example.com/", "CEO").await;
        assert_eq!(outcome, ExtractionOutcome::Empty);
        assert_eq!(NoopExtractor.name(), "noop");
    }
}

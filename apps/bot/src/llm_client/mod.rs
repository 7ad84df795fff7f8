/// LLM client — the single point of entry for all generative calls in the
/// bot. The resolution pipeline treats it as an untrusted, fallible oracle:
/// it must fail loudly (distinct error) rather than return empty, so the
/// deterministic fallback tier can activate.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
const MAX_TOKENS: u32 = 100;
/// Low temperature for consistent form answers.
const TEMPERATURE: f32 = 0.1;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("oracle returned empty content")]
    EmptyContent,

    #[error("multiple-choice request without options")]
    MissingOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    MultipleChoice,
}

/// One fallback query: the applicant's profile as context, the field label,
/// and the option values for multiple-choice fields.
pub struct OracleRequest<'a> {
    pub context: &'a Value,
    pub kind: FieldKind,
    pub label: &'a str,
    pub options: Option<&'a [String]>,
}

/// The generative fallback seam. The pipeline only depends on this trait;
/// tests substitute canned or failing oracles.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn answer(&self, request: OracleRequest<'_>) -> Result<String, OracleError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint, with retry
/// on rate limits and server errors.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
            model,
        }
    }

    /// Makes one chat call and returns the trimmed completion text.
    /// Retries on 429 and 5xx with exponential backoff.
    pub async fn call(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut last_error: Option<OracleError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "oracle call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(OracleError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("oracle API returned {}: {}", status, body);
                last_error = Some(OracleError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(OracleError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let parsed: ChatResponse = response.json().await?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or(OracleError::EmptyContent)?;

            debug!("oracle call succeeded: {} chars", content.len());
            return Ok(content);
        }

        Err(last_error.unwrap_or(OracleError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl Oracle for LlmClient {
    async fn answer(&self, request: OracleRequest<'_>) -> Result<String, OracleError> {
        let context = request.context.to_string();
        let prompt = match request.kind {
            FieldKind::Text => prompts::build_text_prompt(&context, request.label),
            FieldKind::MultipleChoice => {
                let options = request.options.ok_or(OracleError::MissingOptions)?;
                prompts::build_multiple_choice_prompt(&context, request.label, options)
            }
        };
        self.call(prompts::FORM_SYSTEM, &prompt).await
    }
}

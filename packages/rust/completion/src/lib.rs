//! Text-completion client and post section generation.
//!
//! Each post section is one request to an OpenAI-compatible `/completions`
//! endpoint. Requests are issued one at a time with no retry; the first
//! failure is returned to the caller.

pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use stackpost_shared::{CompletionConfig, CompletionError, GeneratedSection, SectionKind};

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("stackpost/", env!("CARGO_PKG_VERSION"));

/// Result alias for this stage.
pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// Body of a `POST /completions` request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    /// Build the request for one section from its prompt template and settings.
    pub fn for_section(config: &CompletionConfig, kind: SectionKind, subject: &str) -> Self {
        let settings = prompts::settings(kind);
        Self {
            model: config.model.clone(),
            prompt: prompts::build_prompt(kind, subject),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Raw text of the first choice plus the reported token usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u64,
}

// ---------------------------------------------------------------------------
// CompletionClient
// ---------------------------------------------------------------------------

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult<Completion>;
}

/// HTTP client for an OpenAI-compatible completions endpoint.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client from the `[completion]` config and a resolved API key.
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> CompletionResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CompletionError::Auth(format!(
                "empty API key (set {})",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/completions", config.base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult<Completion> {
        debug!(endpoint = %self.endpoint, prompt_len = request.prompt.len(), "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth(message),
                _ => CompletionError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default();
        let total_tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        Ok(Completion { text, total_tokens })
    }
}

// ---------------------------------------------------------------------------
// Section generation
// ---------------------------------------------------------------------------

/// Trim generated text and optionally drop its first line.
pub fn postprocess(text: &str, drop_first_line: bool) -> String {
    let trimmed = text.trim();
    if !drop_first_line {
        return trimmed.to_string();
    }
    match trimmed.split_once('\n') {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    }
}

/// Request and post-process one section.
#[instrument(skip(client, config, subject))]
pub async fn generate_section(
    client: &dyn CompletionClient,
    config: &CompletionConfig,
    kind: SectionKind,
    subject: &str,
) -> CompletionResult<GeneratedSection> {
    let request = CompletionRequest::for_section(config, kind, subject);
    let completion = client.complete(&request).await?;

    if completion.text.trim().is_empty() {
        return Err(CompletionError::Empty { section: kind });
    }

    let text = postprocess(&completion.text, prompts::settings(kind).drop_first_line);

    info!(
        section = %kind,
        total_tokens = completion.total_tokens,
        chars = text.len(),
        "section generated"
    );

    Ok(GeneratedSection {
        kind,
        text,
        total_tokens: completion.total_tokens,
    })
}

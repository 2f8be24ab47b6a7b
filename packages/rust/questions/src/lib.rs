//! Question selection from the Stack Exchange search API.
//!
//! A run picks one tag from the configured list, asks the API for the
//! top-voted questions carrying that tag within the configured window, and
//! picks one of the returned questions as the post `Topic`.

mod select;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use stackpost_shared::{QuestionError, QuestionsConfig};

pub use select::{choose_tag, decode_entities, pick_question, select_topic};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("stackpost/", env!("CARGO_PKG_VERSION"));

/// Result alias for this stage.
pub type QuestionResult<T> = std::result::Result<T, QuestionError>;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One question record as returned by `/questions`.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// Title, still HTML-entity encoded.
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub question_id: Option<u64>,
}

/// Response wrapper shared by every Stack Exchange endpoint.
#[derive(Debug, Deserialize)]
struct Wrapper {
    #[serde(default)]
    items: Vec<Question>,
    #[serde(default)]
    quota_remaining: Option<u32>,
    #[serde(default)]
    error_id: Option<u16>,
    #[serde(default)]
    error_name: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Parameters of one search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub tag: String,
    pub page_size: u32,
    /// Oldest creation date to include.
    pub from_date: DateTime<Utc>,
}

impl SearchRequest {
    /// Build the request for `tag` using the configured page size and window.
    ///
    /// A window reaching past the earliest representable date is clamped to it.
    pub fn new(tag: impl Into<String>, config: &QuestionsConfig, now: DateTime<Utc>) -> Self {
        let from_date = now
            .checked_sub_signed(chrono::Duration::days(i64::from(config.window_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            tag: tag.into(),
            page_size: config.page_size,
            from_date,
        }
    }
}

// ---------------------------------------------------------------------------
// QuestionSource
// ---------------------------------------------------------------------------

/// Anything that can answer a top-voted-questions search.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Return the questions matching `request`, highest score first.
    async fn fetch_questions(&self, request: &SearchRequest) -> QuestionResult<Vec<Question>>;
}

/// HTTP client for the Stack Exchange API.
pub struct StackExchangeClient {
    client: Client,
    api_base: String,
    site: String,
    key: Option<String>,
}

impl StackExchangeClient {
    /// Create a client from the `[questions]` config and an optional app key.
    pub fn new(config: &QuestionsConfig, key: Option<String>) -> QuestionResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuestionError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            site: config.site.clone(),
            key,
        })
    }
}

#[async_trait]
impl QuestionSource for StackExchangeClient {
    #[instrument(skip_all, fields(tag = %request.tag, page_size = request.page_size))]
    async fn fetch_questions(&self, request: &SearchRequest) -> QuestionResult<Vec<Question>> {
        let url = format!("{}/questions", self.api_base);

        let mut query: Vec<(&str, String)> = vec![
            ("site", self.site.clone()),
            ("pagesize", request.page_size.to_string()),
            ("fromdate", request.from_date.timestamp().to_string()),
            ("sort", "votes".into()),
            ("order", "desc".into()),
            ("tagged", request.tag.clone()),
        ];
        if let Some(key) = &self.key {
            query.push(("key", key.clone()));
        }

        debug!(%url, "searching questions");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| QuestionError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuestionError::Network(format!("{url}: failed to read body: {e}")))?;

        let wrapper: Option<Wrapper> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let error_id = wrapper.as_ref().and_then(|w| w.error_id);
            let message = wrapper
                .and_then(|w| w.error_message.or(w.error_name))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(QuestionError::Api {
                status: status.as_u16(),
                error_id,
                message,
            });
        }

        let wrapper = wrapper.ok_or_else(|| {
            QuestionError::Decode(format!("{url}: {}", body.chars().take(200).collect::<String>()))
        })?;

        if let Some(error_id) = wrapper.error_id {
            return Err(QuestionError::Api {
                status: status.as_u16(),
                error_id: Some(error_id),
                message: wrapper
                    .error_message
                    .or(wrapper.error_name)
                    .unwrap_or_else(|| "unknown error".into()),
            });
        }

        if let Some(quota) = wrapper.quota_remaining {
            debug!(quota_remaining = quota, "search quota");
        }

        info!(count = wrapper.items.len(), "questions fetched");
        Ok(wrapper.items)
    }
}

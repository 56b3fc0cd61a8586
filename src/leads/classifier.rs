//! Content classifiers
//!
//! A [`ContentClassifier`] reads page text and returns candidate leads, and
//! scores how promising a search result is before it becomes a seed.
//! [`LlmClassifier`] talks to an OpenAI-compatible chat completions
//! endpoint.

use super::types::Lead;
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Classifier failures
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reply could not be parsed: {0}")]
    Unparseable(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl ClassifierError {
    /// Returns true if the call may succeed when repeated
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::Unparseable(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::NotConfigured(_) => false,
        }
    }
}

/// Turns page text into leads
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Extracts candidate leads from page text
    ///
    /// `keyword` is the business category being prospected; it may be empty.
    async fn classify_leads(&self, text: &str, keyword: &str) -> Result<Vec<Lead>, ClassifierError>;

    /// Scores a search result for relevance to `keyword`, from 1 to 10
    async fn score_url_relevance(
        &self,
        url: &str,
        title: &str,
        snippet: &str,
        keyword: &str,
    ) -> Result<u8, ClassifierError>;
}

const LEADS_PROMPT: &str = "You extract business contact leads from web page text. \
Reply with a JSON array only. Each element is an object with the keys \
name, title, company, email, phone, address, rating, review_count, category, website, hours. \
Use null for anything the text does not state. Do not invent contacts. \
Reply with [] if the page lists none.";

const SCORE_PROMPT: &str = "You rate search results for a sales prospecting tool. \
Given a keyword and a search result, reply with a single integer from 1 to 10: \
10 means the result is very likely the website of a business matching the keyword, \
1 means it is unrelated or is a directory, marketplace or social network page.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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

/// Classifier backed by an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_text_chars: usize,
}

impl LlmClassifier {
    pub fn new(config: &ClassifierConfig, api_key: impl Into<String>) -> Result<Self, ClassifierError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClassifierError::NotConfigured("empty API key".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_text_chars: config.max_text_chars,
        })
    }

    /// Builds the classifier if the configured API key variable is set
    pub fn from_env(config: &ClassifierConfig) -> Option<Result<Self, ClassifierError>> {
        std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(config, key))
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Unparseable(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::Unparseable("reply has no content".to_string()))
    }
}

#[async_trait]
impl ContentClassifier for LlmClassifier {
    async fn classify_leads(&self, text: &str, keyword: &str) -> Result<Vec<Lead>, ClassifierError> {
        let text: String = text.chars().take(self.max_text_chars).collect();
        let prompt = if keyword.trim().is_empty() {
            format!("Page text:\n{}", text)
        } else {
            format!("Business category: {}\n\nPage text:\n{}", keyword.trim(), text)
        };

        let content = self.complete(LEADS_PROMPT, &prompt).await?;
        parse_leads(&content)
    }

    async fn score_url_relevance(
        &self,
        url: &str,
        title: &str,
        snippet: &str,
        keyword: &str,
    ) -> Result<u8, ClassifierError> {
        let prompt = format!(
            "Keyword: {}\nURL: {}\nTitle: {}\nSnippet: {}",
            keyword, url, title, snippet
        );
        let content = self.complete(SCORE_PROMPT, &prompt).await?;
        parse_score(&content)
    }
}

/// Parses a classifier reply into leads
///
/// Accepts a bare JSON array, an object with a `leads` array, or either of
/// those wrapped in a Markdown code fence or surrounded by prose.
pub fn parse_leads(content: &str) -> Result<Vec<Lead>, ClassifierError> {
    #[derive(Deserialize)]
    struct Wrapped {
        leads: Vec<Lead>,
    }

    let body = strip_code_fence(content);

    if let Ok(leads) = serde_json::from_str::<Vec<Lead>>(body) {
        return Ok(leads);
    }
    if let Ok(wrapped) = serde_json::from_str::<Wrapped>(body) {
        return Ok(wrapped.leads);
    }

    match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Vec<Lead>>(&body[start..=end])
                .map_err(|e| ClassifierError::Unparseable(e.to_string()))
        }
        _ => Err(ClassifierError::Unparseable(format!(
            "no JSON array in reply: {}",
            body.chars().take(80).collect::<String>()
        ))),
    }
}

/// Parses a relevance score, clamping it to 1..=10
pub fn parse_score(content: &str) -> Result<u8, ClassifierError> {
    let digits: String = content
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    digits
        .parse::<u32>()
        .map(|n| n.clamp(1, 10) as u8)
        .map_err(|_| ClassifierError::Unparseable(format!("no score in reply: {}", content.trim())))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().trim_end_matches("```").trim()
}

//! Translation through an OpenAI-compatible chat completions endpoint.

use crate::config::{Config, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::error::{Result, TranscacheError};
use crate::language::Language;
use crate::translate::Translator;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};

const TEMPERATURE: f32 = 0.2;

/// Translator backed by a chat completion model.
pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTranslator {
    /// Create a new translator with the given API key and default endpoint.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Build a translator from configuration, with the configured request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Set a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different API base, e.g. a proxy or a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn single_prompt(target: Language, source: Language) -> String {
        format!(
            "You are a professional translator for a beauty and styling service website. \
             Translate the user's text from {} to {}. \
             Return ONLY the translated text, nothing else. Preserve all line breaks and formatting.",
            source.name(),
            target.name()
        )
    }

    fn batch_prompt(count: usize, target: Language, source: Language) -> String {
        format!(
            "You are a professional translator for a beauty and styling service website. \
             The user message is a JSON array of {count} strings in {}. \
             Translate every string to {} and respond with a JSON array of exactly {count} strings \
             in the same order. Return ONLY the JSON array. Preserve line breaks inside each string.",
            source.name(),
            target.name()
        )
    }

    async fn complete(&self, system: String, user: String) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(TranscacheError::CredentialsMissing(
                "no API key configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
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

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscacheError::Provider(format!("Translation request timed out: {}", e))
                } else {
                    TranscacheError::Provider(format!("Translation request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscacheError::Provider(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(TranscacheError::Provider(format!(
                "Translation API error ({}): {}",
                status, body
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            TranscacheError::Provider(format!("Failed to parse translation response: {}", e))
        })?;

        if let Some(error) = parsed.error {
            return Err(TranscacheError::Provider(format!(
                "Provider error: {}",
                error.message
            )));
        }

        parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| TranscacheError::Provider("Empty completion".to_string()))
    }
}

/// Parse a model reply that should be a JSON array of `count` strings.
pub(crate) fn parse_batch_response(response: &str, count: usize) -> Result<Vec<String>> {
    let body = strip_code_fence(response);

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        TranscacheError::Provider(format!("Batch response is not JSON: {}", e))
    })?;

    // Some models wrap the array in an object such as {"translations": [...]}.
    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                serde_json::Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                TranscacheError::Provider("Batch response object has no array".to_string())
            })?,
        _ => {
            return Err(TranscacheError::Provider(
                "Batch response is not an array".to_string(),
            ))
        }
    };

    let results: Vec<String> = array
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ok(s),
            other => Err(TranscacheError::Provider(format!(
                "Batch response element is not a string: {}",
                other
            ))),
        })
        .collect::<Result<_>>()?;

    if results.len() != count {
        return Err(TranscacheError::Provider(format!(
            "Batch response has {} items, expected {}",
            results.len(),
            count
        )));
    }

    Ok(results)
}

fn strip_code_fence(response: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid fence regex")
    });
    re.captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| response.trim())
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ChatError>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChatError {
    message: String,
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, target: Language, source: Language) -> Result<String> {
        debug!("Translating {} chars {} -> {}", text.len(), source, target);
        let reply = self
            .complete(Self::single_prompt(target, source), text.to_string())
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn translate_batch(
        &self,
        texts: &[&str],
        target: Language,
        source: Language,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Translating batch of {} {} -> {}", texts.len(), source, target);

        let payload = serde_json::to_string(texts)?;
        let reply = self
            .complete(Self::batch_prompt(texts.len(), target, source), payload)
            .await?;

        parse_batch_response(&reply, texts.len()).inspect_err(|e| {
            warn!("Malformed batch reply for {}: {}", target, e);
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

//! Generative-model collaborator seam.
//!
//! The pipeline treats "send messages to a hosted model, get text back" as
//! an opaque operation behind `ModelClient`. Anything that can go wrong on
//! the other side of the trait (transport, timeout, malformed output) is
//! recovered locally by the caller falling back to its deterministic path.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Role/content pair sent to the model.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Parameters for one model invocation.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model call timed out after {0} ms")]
    Timeout(u64),
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model returned unusable output: {0}")]
    Malformed(String),
}

/// Opaque text-completion collaborator. Implementations wrap whatever hosted
/// API the embedding application talks to.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Result<String, ModelError>;
}

/// Run a model call under its own deadline. A hung transport surfaces as
/// `ModelError::Timeout` so callers treat it like any other model failure.
pub async fn complete_with_timeout(
    client: &dyn ModelClient,
    messages: &[ChatMessage],
    options: &CallOptions,
) -> Result<String, ModelError> {
    match tokio::time::timeout(
        Duration::from_millis(options.timeout_ms),
        client.complete(messages, options),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(options.timeout_ms)),
    }
}

/// Pull a JSON array of strings out of a model reply, tolerating code fences
/// and surrounding prose. `None` when nothing usable is found.
pub fn parse_string_array(raw: &str) -> Option<Vec<String>> {
    let value = extract_json(raw, '[', ']')?;
    let items = value.as_array()?;
    let strings: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if strings.is_empty() {
        None
    } else {
        Some(strings)
    }
}

/// Pull a `{"<index>": <0-100>}` object out of a model reply. Entries with
/// non-numeric keys or values are skipped rather than failing the whole map.
pub fn parse_score_map(raw: &str) -> Option<HashMap<usize, f64>> {
    let value = extract_json(raw, '{', '}')?;
    let object = value.as_object()?;
    let mut scores = HashMap::new();
    for (key, entry) in object {
        let index: usize = match key.trim().parse() {
            Ok(index) => index,
            Err(_) => continue,
        };
        if let Some(score) = entry.as_f64() {
            scores.insert(index, score.clamp(0.0, 100.0));
        }
    }
    if scores.is_empty() {
        None
    } else {
        Some(scores)
    }
}

/// Best-effort extraction of the first JSON value delimited by
/// `open`/`close` in free-form model text.
fn extract_json(raw: &str, open: char, close: char) -> Option<Value> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

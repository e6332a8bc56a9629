//! Remote inference over an OpenAI-compatible chat completions endpoint

use crate::config::RemoteConfig;
use crate::error::{ClassifyError, Result};
use crate::types::{ClassificationMethod, ClassificationResult, UNKNOWN_LABEL};
use regex::Regex;
use serde::Deserialize;
use once_cell::sync::Lazy;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, warn};

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"|'([^']+)'|`([^`]+)`"#).expect("valid quote regex")
});

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("valid separator regex"));

/// Characters of an error body kept in error messages
const ERROR_BODY_EXCERPT: usize = 200;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Asks a remote language model to pick one of the registry labels
///
/// One attempt per call. Failures surface as `RemoteServiceError` and any
/// retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct RemoteInferenceAdapter {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteInferenceAdapter {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClassifyError::ConfigurationError(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Whether an API key and an endpoint are both present
    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// The API key, or the configuration problem that prevents a call
    pub fn credentials(&self) -> Result<&str> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ClassifyError::ConfigurationError(
                    "remote inference needs an API key (DOCSORT_API_KEY or OPENAI_API_KEY)"
                        .to_string(),
                )
            })?;
        if self.config.api_base.trim().is_empty() {
            return Err(ClassifyError::ConfigurationError(
                "remote inference API base is empty".to_string(),
            ));
        }
        Ok(api_key)
    }

    /// Classify `text`, constrained to `labels` plus `"unknown"`
    pub async fn classify(&self, text: &str, labels: &[String]) -> Result<ClassificationResult> {
        let api_key = self.credentials()?;

        let snippet = excerpt(text, self.config.max_excerpt_chars);
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt(labels)},
                {"role": "user", "content": format!("Classify the following document:\n\n{}", snippet)},
            ],
            "temperature": 0,
        });

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        debug!(model = %self.config.model, labels = labels.len(), "Calling remote inference");
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload = response.text().await?;
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote inference responded"
        );

        if !status.is_success() {
            return Err(ClassifyError::RemoteServiceError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                excerpt(&payload, ERROR_BODY_EXCERPT)
            )));
        }

        let answer = parse_answer(&payload)?;
        let label = resolve_label(&answer, labels);
        if label == UNKNOWN_LABEL && normalize(&answer) != UNKNOWN_LABEL {
            warn!(answer = %excerpt(&answer, 80), "Remote answer matched no registry label");
        }
        Ok(ClassificationResult::new(label, ClassificationMethod::RemoteInference))
    }
}

fn system_prompt(labels: &[String]) -> String {
    let mut allowed: Vec<&str> = labels.iter().map(String::as_str).collect();
    allowed.push(UNKNOWN_LABEL);
    format!(
        "You classify documents. Reply with exactly one label from this list and nothing else: {}. \
         Reply \"{}\" if none of the other labels fits.",
        allowed.join(", "),
        UNKNOWN_LABEL
    )
}

fn parse_answer(payload: &str) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_str(payload).map_err(|e| {
        ClassifyError::RemoteServiceError(format!("malformed response payload: {}", e))
    })?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ClassifyError::RemoteServiceError("response has no message content".to_string())
        })
}

/// First `max_chars` characters of `text`
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Lowercase, strip surrounding punctuation, collapse separators to `_`
pub fn normalize(candidate: &str) -> String {
    let lowered = candidate.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    SEPARATOR_RE.replace_all(trimmed, "_").into_owned()
}

/// Map a free-text answer onto `labels`, or `"unknown"`
///
/// Tried in order: the whole answer normalized, then each quoted span, then
/// the earliest label occurring anywhere in the answer (longest label wins
/// when two start at the same position).
pub fn resolve_label(answer: &str, labels: &[String]) -> String {
    let is_label = |candidate: &str| labels.iter().find(|l| l.as_str() == candidate);

    if let Some(label) = is_label(&normalize(answer)) {
        return label.clone();
    }

    for caps in QUOTED_RE.captures_iter(answer) {
        let quoted = caps.iter().skip(1).flatten().next();
        if let Some(label) = quoted.and_then(|m| is_label(&normalize(m.as_str()))) {
            return label.clone();
        }
    }

    let lowered = answer.to_lowercase();
    labels
        .iter()
        .filter_map(|label| {
            let spaced = label.replace('_', " ");
            [lowered.find(label.as_str()), lowered.find(spaced.as_str())]
                .into_iter()
                .flatten()
                .min()
                .map(|pos| (pos, label))
        })
        .min_by(|(pos_a, a), (pos_b, b)| pos_a.cmp(pos_b).then(b.len().cmp(&a.len())))
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

//! `TranslationOracle` trait and `ChatOracle` implementation.
//!
//! `ChatOracle` calls any OpenAI-compatible `/chat/completions` endpoint —
//! Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM, etc. All connection
//! details come from [`TranslationConfig`]; nothing is hardcoded.
//!
//! Batch calls request a structured JSON response so line identifiers
//! survive the round trip; per-line calls optionally stream token deltas.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::config::{LanguageConfig, TranslationConfig};
use crate::translate::context::ContextLine;
use crate::translate::prompt;

use super::TranslateError;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// One line of the current batch, tagged with its per-batch identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLine {
    pub id: String,
    pub text: String,
}

/// A whole batch call: recent translated lines as background, the lines to
/// translate, and free-form job context.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub memory: Vec<ContextLine>,
    pub target: Vec<TargetLine>,
    pub extra_context: String,
}

/// One per-line streaming call with its sliding history.
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub text: String,
    pub history: Vec<(String, String)>,
    pub extra_context: String,
}

/// One `(id, translation)` pair from a structured batch response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranslatedLine {
    pub id: String,
    pub translated_text: String,
}

#[derive(Debug, Deserialize)]
struct BatchResponseBody {
    lines: Vec<TranslatedLine>,
}

// ---------------------------------------------------------------------------
// TranslationOracle trait
// ---------------------------------------------------------------------------

/// The external translation service, behind a seam so tests can script it.
///
/// Trusted for content but **not** for structural obedience: a batch reply
/// may drop, merge, or reorder lines, which the caller detects through the
/// returned identifiers.
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    /// Translate one batch; returns the `(id, translation)` pairs exactly
    /// as the service emitted them, unvalidated.
    async fn translate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<TranslatedLine>, TranslateError>;

    /// Translate a single line, invoking `on_delta` for each partial chunk
    /// when the service streams. Returns the complete translation.
    async fn translate_line(
        &self,
        request: &LineRequest,
        on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// ChatOracle
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatOracle {
    client: reqwest::Client,
    config: TranslationConfig,
    languages: LanguageConfig,
}

impl ChatOracle {
    /// Build a `ChatOracle` from application config.
    ///
    /// The shared client carries no global timeout; each request sets its
    /// own; batch calls legitimately run for minutes while per-line calls
    /// must fail within seconds.
    pub fn from_config(config: &TranslationConfig, languages: &LanguageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
            languages: languages.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            req
        } else {
            req.bearer_auth(key)
        }
    }
}

#[async_trait]
impl TranslationOracle for ChatOracle {
    async fn translate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<TranslatedLine>, TranslateError> {
        let (system_msg, user_msg) = prompt::build_batch_chat(request, &self.languages);

        // Structured output: the service must reply with the id-tagged line
        // array and nothing else.
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream": false,
            "temperature": 0.3,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "translated_lines",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": {
                            "lines": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id":              { "type": "string" },
                                        "translated_text": { "type": "string" }
                                    },
                                    "required": ["id", "translated_text"],
                                    "additionalProperties": false
                                }
                            }
                        },
                        "required": ["lines"],
                        "additionalProperties": false
                    }
                }
            }
        });

        let req = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.batch_timeout_secs))
            .json(&body);

        let response = self.authorize(req).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Request(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(TranslateError::EmptyResponse)?;

        let parsed: BatchResponseBody =
            serde_json::from_str(content).map_err(|e| TranslateError::Parse(e.to_string()))?;

        Ok(parsed.lines)
    }

    async fn translate_line(
        &self,
        request: &LineRequest,
        on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TranslateError> {
        let (system_msg, user_msg) = prompt::build_line_chat(request, &self.languages);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream": self.config.stream_deltas,
            "temperature": 0.3
        });

        let req = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.line_timeout_secs))
            .json(&body);
        let response = self.authorize(req).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Request(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        if !self.config.stream_deltas {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| TranslateError::Parse(e.to_string()))?;
            return line_content(&json);
        }

        // Server-sent events: `data: {chunk}` lines, terminated by
        // `data: [DONE]`.
        let mut full = String::new();
        let mut pending = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            pending.push_str(&String::from_utf8_lossy(&chunk));

            // Process only complete lines; a JSON chunk can straddle reads.
            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                let line = line.trim();
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data.trim() == "[DONE]" {
                    continue;
                }
                let parsed: serde_json::Value = serde_json::from_str(data)
                    .map_err(|e| TranslateError::Parse(e.to_string()))?;
                if let Some(delta) = parsed["choices"][0]["delta"]["content"].as_str() {
                    full.push_str(delta);
                    on_delta(delta);
                }
            }
        }

        let translated = full.trim().to_string();
        if translated.is_empty() {
            return Err(TranslateError::EmptyResponse);
        }
        Ok(translated)
    }
}

/// Extract the assistant message from a non-streaming chat completion.
///
/// A missing, empty, or whitespace-only message is an `EmptyResponse`: a
/// blank translation must surface as an error so the caller can flag the
/// line instead of rendering it empty.
fn line_content(json: &serde_json::Value) -> Result<String, TranslateError> {
    let translated = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(TranslateError::EmptyResponse)?
        .trim()
        .to_string();
    if translated.is_empty() {
        return Err(TranslateError::EmptyResponse);
    }
    Ok(translated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_response_body_parses() {
        let content = r#"{"lines": [
            {"id": "a1b2", "translated_text": "Hello."},
            {"id": "c3d4", "translated_text": "How are you?"}
        ]}"#;
        let parsed: BatchResponseBody = serde_json::from_str(content).unwrap();
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].id, "a1b2");
        assert_eq!(parsed.lines[1].translated_text, "How are you?");
    }

    #[test]
    fn line_content_extracts_message_text() {
        let json = serde_json::json!({
            "choices": [{ "message": { "content": "  Hello there.  " } }]
        });
        assert_eq!(line_content(&json).unwrap(), "Hello there.");
    }

    /// A whitespace-only completion must error rather than come back as an
    /// empty translation.
    #[test]
    fn line_content_rejects_blank_message() {
        let blank = serde_json::json!({
            "choices": [{ "message": { "content": "  " } }]
        });
        assert!(matches!(
            line_content(&blank),
            Err(TranslateError::EmptyResponse)
        ));

        let missing = serde_json::json!({ "choices": [] });
        assert!(matches!(
            line_content(&missing),
            Err(TranslateError::EmptyResponse)
        ));
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _oracle = ChatOracle::from_config(
            &TranslationConfig::default(),
            &LanguageConfig::default(),
        );
    }

    #[test]
    fn oracle_is_object_safe() {
        fn _assert(_: Box<dyn TranslationOracle>) {}
    }
}

//! Whisper-style HTTP transcription backend.
//!
//! Uploads one WAV window at a time to an OpenAI-compatible
//! `/audio/transcriptions` endpoint with word-level timestamps enabled, and
//! drives the window-retry loop over the whole source file.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::audio::decode_file;
use crate::config::{AsrConfig, SegmenterConfig, WindowConfig};
use crate::subtitle::{Phrase, Word};

use super::windowed::{transcribe_windowed, WindowTranscriber};
use super::{AsrError, SpeechToText};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    words: Vec<ApiWord>,
}

#[derive(Debug, Deserialize)]
struct ApiWord {
    word: String,
    start: f64,
    end: f64,
}

// ---------------------------------------------------------------------------
// WhisperApiBackend
// ---------------------------------------------------------------------------

/// Batch transcription via a payload-limited Whisper-compatible API.
pub struct WhisperApiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    window_cfg: WindowConfig,
    segmenter_cfg: SegmenterConfig,
}

impl WhisperApiBackend {
    pub fn new(
        asr: &AsrConfig,
        window: &WindowConfig,
        segmenter: &SegmenterConfig,
    ) -> Result<Self, AsrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(asr.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: asr.base_url.trim_end_matches('/').to_string(),
            api_key: asr.api_key.clone().unwrap_or_default(),
            model: asr.model.clone(),
            window_cfg: window.clone(),
            segmenter_cfg: segmenter.clone(),
        })
    }
}

#[async_trait]
impl WindowTranscriber for WhisperApiBackend {
    async fn transcribe_window(
        &self,
        wav_bytes: &[u8],
        prompt: &str,
        language: &str,
    ) -> Result<Vec<Word>, AsrError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = Part::bytes(wav_bytes.to_vec())
            .file_name("window.wav")
            .mime_str("audio/wav")?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");
        if !language.is_empty() {
            form = form.text("language", language.to_string());
        }
        if !prompt.is_empty() {
            form = form.text("prompt", prompt.to_string());
        }

        let mut request = self.client.post(&url).multipart(form);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AsrError::Request(format!(
                "transcription endpoint returned {status}: {body}"
            )));
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| AsrError::Parse(e.to_string()))?;

        Ok(parsed
            .words
            .into_iter()
            .map(|w| Word::new(w.start, w.end, w.word))
            .collect())
    }
}

#[async_trait]
impl SpeechToText for WhisperApiBackend {
    async fn speech_to_text(
        &self,
        input: &Path,
        prompt: &str,
        language: &str,
    ) -> Result<Vec<Phrase>, AsrError> {
        let source = decode_file(input)?;
        log::info!(
            "decoded {:?}: {:.1}s at {} Hz",
            input.file_name().unwrap_or_default(),
            source.duration_secs(),
            source.sample_rate
        );

        transcribe_windowed(
            &source,
            self,
            &self.window_cfg,
            &self.segmenter_cfg,
            prompt,
            language,
        )
        .await
    }
}

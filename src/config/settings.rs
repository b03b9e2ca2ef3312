//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LanguageConfig
// ---------------------------------------------------------------------------

/// Source and target languages for the whole job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// ISO-639-1 code of the spoken language (sent to the ASR backend).
    pub source: String,
    /// Name of the language to translate into (embedded in oracle prompts).
    pub target: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            source: "ja".into(),
            target: "English".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AsrBackendKind
// ---------------------------------------------------------------------------

/// Selects which speech-to-text backend produces the phrase list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AsrBackendKind {
    /// Windowed upload of a pre-recorded file to a Whisper-style
    /// transcription API with word-level timestamps.
    WhisperApi,
    /// Re-use an existing SRT file's lines as the phrase list (no audio).
    SrtReplay,
}

impl Default for AsrBackendKind {
    fn default() -> Self {
        Self::WhisperApi
    }
}

// ---------------------------------------------------------------------------
// AsrConfig
// ---------------------------------------------------------------------------

/// Settings for the transcription backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// Which backend to use.
    pub backend: AsrBackendKind,
    /// Base URL of the transcription API (OpenAI-compatible `/v1`).
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"whisper-1"`).
    pub model: String,
    /// Vocabulary/priming prompt forwarded with every upload.
    pub prompt: String,
    /// Maximum seconds to wait for one window's transcription.
    pub timeout_secs: u64,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            backend: AsrBackendKind::default(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "whisper-1".into(),
            prompt: String::new(),
            timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// WindowConfig
// ---------------------------------------------------------------------------

/// Settings for slicing long audio into upload-sized windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Upload byte budget per window. Window duration is derived from this
    /// and the fixed PCM encoding rate, independent of audio content.
    pub target_bytes: u64,
    /// A window whose trailing silence exceeds this did not cut a sentence.
    pub sentence_boundary_secs: f64,
    /// Backward padding applied when re-anchoring the next window start.
    pub start_pad_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            target_bytes: 24 * 1024 * 1024,
            sentence_boundary_secs: 0.35,
            start_pad_secs: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// SegmenterConfig
// ---------------------------------------------------------------------------

/// Thresholds for grouping words into subtitle lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Soft target line length in words; silence splitting relaxes past it.
    pub target_phrase_len: usize,
    /// Hard maximum line length in words; always split at this point.
    pub max_phrase_len: usize,
    /// Silence gap that splits a line within the target length.
    pub silence_gap_secs: f64,
    /// Much shorter silence gap applied once past the target length.
    pub silence_gap_short_secs: f64,
    /// A single word longer than this splits the line once past the target
    /// length.
    pub long_word_secs: f64,
    /// Sentence-end delimiters that always split a line.
    ///
    /// Language-specific: the default suits Japanese transcripts. Not a
    /// general punctuation model — swap the set per source language.
    pub break_punctuation: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            target_phrase_len: 30,
            max_phrase_len: 50,
            silence_gap_secs: 0.35,
            silence_gap_short_secs: 0.1,
            long_word_secs: 0.5,
            break_punctuation: ["。", "？", "?", "！", "!"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// TranslatorKind
// ---------------------------------------------------------------------------

/// Selects which translator fills in `translated_text`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TranslatorKind {
    /// Chat-completions oracle with structural validation.
    Chat,
    /// Copy the source text through unchanged (timing-only runs, tests).
    Passthrough,
}

impl Default for TranslatorKind {
    fn default() -> Self {
        Self::Chat
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the translation oracle and the batching protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Which translator to use.
    pub translator: TranslatorKind,
    /// Base URL of the chat-completions endpoint (OpenAI-compatible `/v1`).
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gpt-4o-mini"`, `"qwen2.5:7b"`).
    pub model: String,
    /// Number of phrases per batch request.
    pub batch_size: usize,
    /// Number of already-translated lines carried between batches (and as
    /// sliding history in streaming mode) for continuity.
    pub context_lines: usize,
    /// Maximum seconds to wait for one batch call. Structured batch calls
    /// can legitimately take minutes.
    pub batch_timeout_secs: u64,
    /// Maximum seconds to wait for one per-line streaming call.
    pub line_timeout_secs: u64,
    /// Request token-by-token output for per-line calls so partial
    /// translations can be rendered as they arrive.
    pub stream_deltas: bool,
    /// Free-form background (show synopsis, names, spelling preferences)
    /// appended to every oracle prompt.
    pub extra_context: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            translator: TranslatorKind::default(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            batch_size: 100,
            context_lines: 4,
            batch_timeout_secs: 900,
            line_timeout_secs: 8,
            stream_deltas: false,
            extra_context: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source / target languages.
    pub language: LanguageConfig,
    /// Transcription backend settings.
    pub asr: AsrConfig,
    /// Audio windowing settings.
    pub window: WindowConfig,
    /// Subtitle-line chunking thresholds.
    pub segmenter: SegmenterConfig,
    /// Translation oracle and batching settings.
    pub translation: TranslationConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

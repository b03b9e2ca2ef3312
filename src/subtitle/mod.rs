//! Subtitle data model and SRT file I/O.
//!
//! This module provides:
//! * [`Word`] — a single timestamped word emitted by an ASR backend.
//! * [`Phrase`] — a subtitle-line-sized unit of transcribed (and later
//!   translated) text with start/end timestamps.
//! * [`write_srt`] / [`read_srt`] — SRT serialisation and parsing.

pub mod reader;
pub mod writer;

pub use reader::read_srt;
pub use writer::{write_srt, write_srt_to};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Word
// ---------------------------------------------------------------------------

/// A single timestamped word produced by an ASR backend.
///
/// Words are immutable once created. Invariant: `end >= start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Start time in seconds from the beginning of the source.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Word text as emitted by the backend (may include trailing punctuation).
    pub text: String,
}

impl Word {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration of this word in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ---------------------------------------------------------------------------
// Phrase
// ---------------------------------------------------------------------------

/// A subtitle line: a group of words with a shared time span, plus the
/// translation filled in later by a translator.
///
/// Created by the segmenter (`start`/`end`/`text` set), mutated exactly once
/// by a translator (`translated_text` set). `id` exists solely to verify
/// alignment through the translation round-trip and is never written to the
/// final subtitle file:
///
/// * streaming mode — monotonic counter assigned by the segmenter;
/// * batch mode — random short token synthesized per translation batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Phrase {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
    pub translated_text: String,
    pub id: Option<String>,
}

impl Phrase {
    /// Create an untranslated phrase spanning `[start, end]`.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            text: text.into(),
            translated_text: String::new(),
            id: None,
        }
    }

    /// Returns `true` once a translator has filled in `translated_text`.
    /// A translated phrase is terminal and must not be re-segmented.
    pub fn is_translated(&self) -> bool {
        !self.translated_text.is_empty()
    }
}

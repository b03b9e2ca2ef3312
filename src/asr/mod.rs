//! Speech-to-text backends.
//!
//! # Architecture
//!
//! [`SpeechToText`] is the capability interface used by the batch pipeline:
//! one method, one job — turn an input file into an ordered phrase list.
//! Implementations are object-safe and `Send + Sync` so they can be held
//! behind an `Arc<dyn SpeechToText>`; selection is a configuration choice.
//!
//! * [`WhisperApiBackend`] — uploads windowed WAV slices of a pre-recorded
//!   file to a Whisper-style API and segments the word timestamps.
//! * [`SrtReplayBackend`] — re-reads an existing SRT file as the phrase
//!   list (no audio involved).
//!
//! The live pipeline instead consumes a [`WordSource`], which publishes
//! finalised words onto the event bus as they arrive. [`JsonlReplaySource`]
//! replays a recorded word log with real-time pacing; concrete
//! microphone/websocket transports live outside this crate.

pub mod replay;
pub mod srt_replay;
pub mod whisper_api;
pub mod windowed;

pub use replay::JsonlReplaySource;
pub use srt_replay::SrtReplayBackend;
pub use whisper_api::WhisperApiBackend;
pub use windowed::{transcribe_windowed, WindowTranscriber};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::bus::EventBus;
use crate::subtitle::{reader::SrtParseError, Phrase};

// ---------------------------------------------------------------------------
// AsrError
// ---------------------------------------------------------------------------

/// All errors that can arise from the transcription subsystem.
#[derive(Debug, Error)]
pub enum AsrError {
    /// The source audio could not be decoded or sliced — fatal for the job.
    #[error(transparent)]
    Audio(#[from] crate::audio::AudioError),

    /// HTTP transport or connection error talking to the ASR service.
    #[error("transcription request failed: {0}")]
    Request(String),

    /// The service response could not be parsed as expected JSON.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),

    /// The replayed subtitle file was malformed.
    #[error(transparent)]
    Srt(#[from] SrtParseError),

    /// Word-log replay I/O failure.
    #[error("failed to read word log: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AsrError {
    fn from(e: reqwest::Error) -> Self {
        AsrError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// SpeechToText trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for batch speech-to-text backends.
///
/// # Contract
///
/// Returned phrases are in chronological order with `start`/`end`/`text`
/// set and `translated_text` empty.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe `input` into an ordered, untranslated phrase list.
    ///
    /// # Arguments
    /// * `input`    – media file (or subtitle file, for replay backends).
    /// * `prompt`   – vocabulary/priming text forwarded to the service.
    /// * `language` – ISO-639-1 code of the spoken language.
    async fn speech_to_text(
        &self,
        input: &Path,
        prompt: &str,
        language: &str,
    ) -> Result<Vec<Phrase>, AsrError>;
}

// Compile-time assertion: Box<dyn SpeechToText> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechToText>) {}
};

// ---------------------------------------------------------------------------
// WordSource trait (live pipeline)
// ---------------------------------------------------------------------------

/// A live word producer: runs until its underlying session ends, publishing
/// a `WordFinal` event for every word the ASR service finalises, in
/// chronological order.
#[async_trait]
pub trait WordSource: Send {
    async fn run(&mut self, bus: Arc<EventBus>) -> Result<(), AsrError>;
}

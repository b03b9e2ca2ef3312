//! Subtitle-file replay backend.
//!
//! Treats an existing SRT file as the transcription result: each subtitle
//! block becomes one untranslated phrase. Useful for re-translating a file
//! without paying for transcription again, and for exercising the
//! translation stage in isolation.

use std::path::Path;

use async_trait::async_trait;

use crate::subtitle::{read_srt, Phrase};

use super::{AsrError, SpeechToText};

#[derive(Debug, Default)]
pub struct SrtReplayBackend;

impl SrtReplayBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechToText for SrtReplayBackend {
    async fn speech_to_text(
        &self,
        input: &Path,
        _prompt: &str,
        _language: &str,
    ) -> Result<Vec<Phrase>, AsrError> {
        let phrases = read_srt(input)?;
        log::info!("replayed {} phrases from {:?}", phrases.len(), input);
        Ok(phrases)
    }
}

//! Batch pipeline: file in, translated subtitle file out.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::asr::{SpeechToText, SrtReplayBackend, WhisperApiBackend};
use crate::config::{AppConfig, AsrBackendKind, TranslatorKind};
use crate::subtitle::write_srt_to;
use crate::translate::{
    BatchTranslator, ChatOracle, PassthroughTranslator, Translator,
};

/// Build the configured transcription backend.
pub fn make_backend(config: &AppConfig) -> Result<Arc<dyn SpeechToText>> {
    Ok(match config.asr.backend {
        AsrBackendKind::WhisperApi => Arc::new(
            WhisperApiBackend::new(&config.asr, &config.window, &config.segmenter)
                .context("failed to build transcription backend")?,
        ),
        AsrBackendKind::SrtReplay => Arc::new(SrtReplayBackend::new()),
    })
}

/// Build the configured whole-list translator.
pub fn make_translator(config: &AppConfig) -> Arc<dyn Translator> {
    match config.translation.translator {
        TranslatorKind::Chat => {
            let oracle = Arc::new(ChatOracle::from_config(
                &config.translation,
                &config.language,
            ));
            Arc::new(BatchTranslator::new(oracle, &config.translation))
        }
        TranslatorKind::Passthrough => Arc::new(PassthroughTranslator::new()),
    }
}

/// Transcribe `input`, translate every line, and write the SRT to `output`.
pub async fn run_batch(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let backend = make_backend(config)?;
    let translator = make_translator(config);

    let mut phrases = backend
        .speech_to_text(input, &config.asr.prompt, &config.language.source)
        .await
        .with_context(|| format!("transcription of {} failed", input.display()))?;

    if phrases.is_empty() {
        log::warn!("no speech found in {}", input.display());
    }

    translator
        .translate(&mut phrases)
        .await
        .context("translation failed")?;

    write_srt_to(&phrases, output)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// SRT replay in, passthrough translation, SRT out: the full batch
    /// pipeline with no network.
    #[tokio::test]
    async fn srt_replay_round_trip() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(
            input,
            "1\n00:00:00,000 --> 00:00:01,000\nこんにちは。\n\n2\n00:00:02,000 --> 00:00:03,000\n元気?\n"
        )
        .unwrap();
        let output = tempfile::NamedTempFile::new().unwrap();

        let config = AppConfig {
            asr: crate::config::AsrConfig {
                backend: AsrBackendKind::SrtReplay,
                ..Default::default()
            },
            translation: crate::config::TranslationConfig {
                translator: TranslatorKind::Passthrough,
                ..Default::default()
            },
            ..Default::default()
        };

        run_batch(&config, input.path(), output.path()).await.unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert!(written.contains("こんにちは。"));
        assert!(written.contains("00:00:02,000"));
    }
}

//! Live pipeline: word source → segmenter → streaming translator → stdout.
//!
//! Every stage is a bus subscriber with its own FIFO queue and worker, so
//! all of them run concurrently on one cooperative scheduler while each
//! stage still observes its input strictly in order. Each stage publishes
//! a terminal event after its last data event, which lets the next stage
//! drain fully before shutting down.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::asr::WordSource;
use crate::bus::{BusEvent, EventBus, EventKind};
use crate::config::{AppConfig, SegmenterConfig, TranslatorKind};
use crate::segment::StreamSegmenter;
use crate::subtitle::{write_srt_to, Phrase};
use crate::translate::{ChatOracle, LineTranslator, TranslationOracle};

/// Run the live pipeline until the word source ends.
///
/// Translated lines are printed as they finalise; when `output` is given the
/// collected lines are also written as an SRT file at the end.
pub async fn run_live(
    config: &AppConfig,
    mut source: Box<dyn WordSource>,
    output: Option<&Path>,
) -> Result<()> {
    let bus = Arc::new(EventBus::new());

    // Renderer queue must be registered before anything can publish.
    let mut render_rx = bus.subscribe_channel(&[
        EventKind::TranslationDelta,
        EventKind::TranslationFinal,
    ]);

    let segmenter = spawn_segmenter(bus.clone(), config.segmenter.clone());
    let translator = spawn_translator(config, bus.clone());

    let source_bus = bus.clone();
    let source_task: JoinHandle<()> = tokio::spawn(async move {
        if let Err(e) = source.run(source_bus.clone()).await {
            // The stream is over either way; make sure downstream drains.
            log::error!("word source failed: {e}");
            source_bus.publish(BusEvent::EndOfStream);
        }
    });

    // Drop our handle so the renderer queue closes once every worker is
    // done and has released its own clone.
    drop(bus);

    let stream_deltas = config.translation.stream_deltas;
    let mut finals: Vec<Phrase> = Vec::new();
    while let Some(event) = render_rx.recv().await {
        match event {
            BusEvent::TranslationDelta { text, .. } if stream_deltas => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            BusEvent::TranslationFinal(phrase) => {
                if stream_deltas {
                    println!();
                } else {
                    println!("{}", phrase.translated_text);
                }
                finals.push(phrase);
            }
            _ => {}
        }
    }

    source_task.await?;
    segmenter.await?;
    translator.await?;

    if let Some(path) = output {
        write_srt_to(&finals, path)?;
    }
    Ok(())
}

/// Words in, subtitle lines out; republishes the end-of-stream marker as a
/// chunk-stream terminal after the final flush.
fn spawn_segmenter(bus: Arc<EventBus>, cfg: SegmenterConfig) -> JoinHandle<()> {
    let mut rx = bus.subscribe_channel(&[EventKind::WordFinal, EventKind::EndOfStream]);
    tokio::spawn(async move {
        let mut segmenter = StreamSegmenter::with_ids(cfg);
        while let Some(event) = rx.recv().await {
            match event {
                BusEvent::WordFinal(word) => {
                    for phrase in segmenter.push(word) {
                        bus.publish(BusEvent::SubtitleChunk(phrase));
                    }
                }
                BusEvent::EndOfStream => {
                    if let Some(phrase) = segmenter.finish() {
                        bus.publish(BusEvent::SubtitleChunk(phrase));
                    }
                    bus.publish(BusEvent::SubtitleStreamEnd);
                    break;
                }
                _ => {}
            }
        }
    })
}

fn spawn_translator(config: &AppConfig, bus: Arc<EventBus>) -> JoinHandle<()> {
    let oracle: Arc<dyn TranslationOracle> = match config.translation.translator {
        TranslatorKind::Chat => Arc::new(ChatOracle::from_config(
            &config.translation,
            &config.language,
        )),
        TranslatorKind::Passthrough => Arc::new(PassthroughOracle),
    };
    let translator = LineTranslator::new(oracle, &config.translation);
    translator.spawn(bus)
}

/// Line-level passthrough for dry runs of the live pipeline.
struct PassthroughOracle;

#[async_trait::async_trait]
impl TranslationOracle for PassthroughOracle {
    async fn translate_batch(
        &self,
        request: &crate::translate::BatchRequest,
    ) -> Result<Vec<crate::translate::TranslatedLine>, crate::translate::TranslateError> {
        Ok(request
            .target
            .iter()
            .map(|line| crate::translate::TranslatedLine {
                id: line.id.clone(),
                translated_text: line.text.clone(),
            })
            .collect())
    }

    async fn translate_line(
        &self,
        request: &crate::translate::LineRequest,
        _on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, crate::translate::TranslateError> {
        Ok(request.text.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::asr::JsonlReplaySource;
    use crate::config::TranslationConfig;

    /// Word-log replay through segmenter and passthrough translator, out to
    /// an SRT file: the full live pipeline with no network.
    #[tokio::test(start_paused = true)]
    async fn word_log_replay_produces_subtitles() {
        let mut log = tempfile::NamedTempFile::new().unwrap();
        writeln!(log, r#"{{"start": 0.0, "end": 0.4, "text": "こんにちは"}}"#).unwrap();
        writeln!(log, r#"{{"start": 0.4, "end": 0.9, "text": "。"}}"#).unwrap();
        writeln!(log, r#"{{"start": 1.5, "end": 1.8, "text": "元気"}}"#).unwrap();
        writeln!(log, r#"{{"start": 1.8, "end": 2.0, "text": "?"}}"#).unwrap();
        let output = tempfile::NamedTempFile::new().unwrap();

        let config = AppConfig {
            translation: TranslationConfig {
                translator: TranslatorKind::Passthrough,
                ..Default::default()
            },
            ..Default::default()
        };

        let source = Box::new(JsonlReplaySource::new(log.path(), 100.0));
        run_live(&config, source, Some(output.path())).await.unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert!(written.contains("こんにちは。"));
        assert!(written.contains("元気?"));
        // The segmenter split on the sentence boundary, so two blocks.
        assert!(written.contains("\n2\n"));
    }
}

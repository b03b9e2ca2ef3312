//! Word-log replay source for the live pipeline.
//!
//! Replays a JSON-lines file of finalised words (one [`Word`] object per
//! line) onto the event bus, pacing each word to its recorded end time so
//! downstream components see the same timing a live ASR session would
//! produce. A speed factor above 1.0 compresses the replay.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::bus::{BusEvent, EventBus};
use crate::subtitle::Word;

use super::{AsrError, WordSource};

pub struct JsonlReplaySource {
    path: PathBuf,
    speed: f64,
}

impl JsonlReplaySource {
    pub fn new(path: impl Into<PathBuf>, speed: f64) -> Self {
        Self {
            path: path.into(),
            speed: if speed > 0.0 { speed } else { 1.0 },
        }
    }
}

#[async_trait]
impl WordSource for JsonlReplaySource {
    async fn run(&mut self, bus: Arc<EventBus>) -> Result<(), AsrError> {
        let content = tokio::fs::read_to_string(&self.path).await?;

        let mut clock_secs = 0.0f64;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let word: Word = serde_json::from_str(line)
                .map_err(|e| AsrError::Parse(format!("word log line {}: {e}", line_no + 1)))?;

            // Wait until the word would have been finalised.
            let wait = (word.end - clock_secs) / self.speed;
            if wait > 0.0 {
                sleep(Duration::from_secs_f64(wait)).await;
            }
            clock_secs = clock_secs.max(word.end);

            bus.publish(BusEvent::WordFinal(word));
        }

        bus.publish(BusEvent::EndOfStream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::bus::EventKind;

    #[tokio::test(start_paused = true)]
    async fn replays_words_in_order_and_signals_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"start": 0.0, "end": 0.4, "text": "こんにちは"}}"#).unwrap();
        writeln!(file, r#"{{"start": 0.4, "end": 0.9, "text": "。"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"start": 1.5, "end": 2.0, "text": "元気?"}}"#).unwrap();

        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe_channel(&[EventKind::WordFinal, EventKind::EndOfStream]);

        let mut source = JsonlReplaySource::new(file.path(), 10.0);
        source.run(bus).await.unwrap();

        let mut texts = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                BusEvent::WordFinal(w) => texts.push(w.text),
                BusEvent::EndOfStream => break,
                _ => unreachable!(),
            }
        }
        assert_eq!(texts, ["こんにちは", "。", "元気?"]);
    }

    #[tokio::test]
    async fn malformed_line_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let bus = Arc::new(EventBus::new());
        let mut source = JsonlReplaySource::new(file.path(), 1.0);
        let err = source.run(bus).await.unwrap_err();
        assert!(matches!(err, AsrError::Parse(_)));
    }
}

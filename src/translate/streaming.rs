//! Per-line streaming translation over the event bus.
//!
//! [`LineTranslator`] subscribes to finalised subtitle lines and issues one
//! oracle call per line — no batching, no identifier validation, because a
//! single-line call cannot be misaligned. Each call carries a sliding
//! history of prior `(source, translation)` pairs for continuity.
//!
//! For every line it publishes zero or more [`BusEvent::TranslationDelta`]
//! events (when the oracle streams partial output) followed by exactly one
//! [`BusEvent::TranslationFinal`], all tagged with the identifier the
//! segmenter assigned. A failed or timed-out call still produces the final
//! event, with the failure marker as the translation, so the renderer never
//! waits on a line forever.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::bus::{BusEvent, EventBus, EventKind};
use crate::config::TranslationConfig;
use crate::subtitle::Phrase;

use super::oracle::{LineRequest, TranslationOracle};
use super::TRANSLATION_FAILED_MARKER;

pub struct LineTranslator {
    oracle: Arc<dyn TranslationOracle>,
    config: TranslationConfig,
    history: VecDeque<(String, String)>,
}

impl LineTranslator {
    pub fn new(oracle: Arc<dyn TranslationOracle>, config: &TranslationConfig) -> Self {
        Self {
            oracle,
            config: config.clone(),
            history: VecDeque::new(),
        }
    }

    /// Subscribe and start the dedicated worker task.
    ///
    /// The subscription is registered before this returns, so no line
    /// published afterwards can be missed. Lines are translated one at a
    /// time in arrival order, so translation events can never be published
    /// out of line order.
    pub fn spawn(self, bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
        let rx = bus.subscribe_channel(&[EventKind::SubtitleChunk, EventKind::SubtitleStreamEnd]);
        tokio::spawn(self.run(bus, rx))
    }

    async fn run(mut self, bus: Arc<EventBus>, mut rx: UnboundedReceiver<BusEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                BusEvent::SubtitleChunk(phrase) => self.handle_line(&bus, phrase).await,
                BusEvent::SubtitleStreamEnd => break,
                _ => {}
            }
        }
        log::info!("streaming translator finished");
    }

    async fn handle_line(&mut self, bus: &EventBus, mut phrase: Phrase) {
        let request = LineRequest {
            text: phrase.text.clone(),
            history: self.history.iter().cloned().collect(),
            extra_context: self.config.extra_context.clone(),
        };

        let id = phrase.id.clone().unwrap_or_default();
        let mut on_delta = |delta: &str| {
            bus.publish(BusEvent::TranslationDelta {
                id: id.clone(),
                text: delta.to_string(),
            });
        };

        match self.oracle.translate_line(&request, &mut on_delta).await {
            Ok(translated) => {
                phrase.translated_text = translated;
                self.history
                    .push_back((phrase.text.clone(), phrase.translated_text.clone()));
                while self.history.len() > self.config.context_lines {
                    self.history.pop_front();
                }
            }
            Err(e) => {
                // Unrecovered by design: there is no retry path for a live
                // line, the show must go on.
                log::warn!("line translation failed: {e}");
                phrase.translated_text = TRANSLATION_FAILED_MARKER.to_string();
            }
        }

        bus.publish(BusEvent::TranslationFinal(phrase));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::translate::oracle::{BatchRequest, TranslatedLine};
    use crate::translate::TranslateError;

    /// Streams the translation in two deltas; records received histories.
    struct StreamingEcho {
        histories: Mutex<Vec<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl TranslationOracle for StreamingEcho {
        async fn translate_batch(
            &self,
            _request: &BatchRequest,
        ) -> Result<Vec<TranslatedLine>, TranslateError> {
            unreachable!("streaming translator never calls translate_batch")
        }

        async fn translate_line(
            &self,
            request: &LineRequest,
            on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<String, TranslateError> {
            self.histories.lock().unwrap().push(request.history.clone());
            on_delta("EN:");
            on_delta(&request.text);
            Ok(format!("EN:{}", request.text))
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl TranslationOracle for FailingOracle {
        async fn translate_batch(
            &self,
            _request: &BatchRequest,
        ) -> Result<Vec<TranslatedLine>, TranslateError> {
            unreachable!()
        }

        async fn translate_line(
            &self,
            _request: &LineRequest,
            _on_delta: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<String, TranslateError> {
            Err(TranslateError::Timeout)
        }
    }

    fn chunk(id: &str, text: &str) -> BusEvent {
        let mut phrase = Phrase::new(0.0, 1.0, text);
        phrase.id = Some(id.to_string());
        BusEvent::SubtitleChunk(phrase)
    }

    #[tokio::test]
    async fn deltas_then_final_per_line_with_growing_history() {
        let oracle = Arc::new(StreamingEcho {
            histories: Mutex::new(Vec::new()),
        });
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe_channel(&[
            EventKind::TranslationDelta,
            EventKind::TranslationFinal,
        ]);

        let translator = LineTranslator::new(oracle.clone(), &TranslationConfig::default());
        let worker = translator.spawn(bus.clone());

        bus.publish(chunk("0", "こんにちは。"));
        bus.publish(chunk("1", "元気?"));
        bus.publish(BusEvent::SubtitleStreamEnd);
        worker.await.unwrap();
        drop(bus);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 6); // 2 deltas + 1 final, per line

        assert!(matches!(
            &events[0],
            BusEvent::TranslationDelta { id, text } if id == "0" && text == "EN:"
        ));
        assert!(matches!(
            &events[2],
            BusEvent::TranslationFinal(p)
                if p.id.as_deref() == Some("0") && p.translated_text == "EN:こんにちは。"
        ));
        assert!(matches!(
            &events[5],
            BusEvent::TranslationFinal(p) if p.translated_text == "EN:元気?"
        ));

        // Second call saw the first line's pair as history.
        let histories = oracle.histories.lock().unwrap();
        assert!(histories[0].is_empty());
        assert_eq!(
            histories[1],
            vec![("こんにちは。".to_string(), "EN:こんにちは。".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_line_still_produces_a_final_event() {
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe_channel(&[EventKind::TranslationFinal]);

        let translator = LineTranslator::new(Arc::new(FailingOracle), &TranslationConfig::default());
        let worker = translator.spawn(bus.clone());

        bus.publish(chunk("0", "だめ"));
        bus.publish(BusEvent::SubtitleStreamEnd);
        worker.await.unwrap();
        drop(bus);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            BusEvent::TranslationFinal(p) if p.translated_text == TRANSLATION_FAILED_MARKER
        ));
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let oracle = Arc::new(StreamingEcho {
            histories: Mutex::new(Vec::new()),
        });
        let bus = Arc::new(EventBus::new());

        let config = TranslationConfig {
            context_lines: 2,
            ..TranslationConfig::default()
        };
        let translator = LineTranslator::new(oracle.clone(), &config);
        let worker = translator.spawn(bus.clone());

        for i in 0..5 {
            bus.publish(chunk(&i.to_string(), &format!("行{i}")));
        }
        bus.publish(BusEvent::SubtitleStreamEnd);
        worker.await.unwrap();

        let histories = oracle.histories.lock().unwrap();
        assert_eq!(histories[4].len(), 2);
        assert_eq!(histories[4][0].0, "行2");
        assert_eq!(histories[4][1].0, "行3");
    }
}

//! In-process publish/subscribe event bus for the live pipeline.
//!
//! Publishing an event delivers one copy to every subscriber registered for
//! its kind. There is no ordering guarantee *between* subscribers, but each
//! subscriber observes its own events in publication order: every subscriber
//! owns a private FIFO queue fed by the bus, drained by a single dedicated
//! worker task. Publishes may race to enqueue, but only one event is ever in
//! flight per subscriber, so later events are never handled before earlier
//! ones.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::subtitle::{Phrase, Word};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event kinds a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A live ASR backend finalised one word.
    WordFinal,
    /// The segmenter closed a subtitle line.
    SubtitleChunk,
    /// The streaming translator produced partial output for a line.
    TranslationDelta,
    /// The streaming translator finished a line.
    TranslationFinal,
    /// The word source ended; no further word events will follow.
    EndOfStream,
    /// The segmenter flushed its last line; no further chunk events will
    /// follow. Published *after* the final chunk so a chunk subscriber's
    /// queue ends in the right order.
    SubtitleStreamEnd,
}

/// A published event with its payload.
#[derive(Debug, Clone)]
pub enum BusEvent {
    WordFinal(Word),
    SubtitleChunk(Phrase),
    TranslationDelta { id: String, text: String },
    TranslationFinal(Phrase),
    EndOfStream,
    SubtitleStreamEnd,
}

impl BusEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BusEvent::WordFinal(_) => EventKind::WordFinal,
            BusEvent::SubtitleChunk(_) => EventKind::SubtitleChunk,
            BusEvent::TranslationDelta { .. } => EventKind::TranslationDelta,
            BusEvent::TranslationFinal(_) => EventKind::TranslationFinal,
            BusEvent::EndOfStream => EventKind::EndOfStream,
            BusEvent::SubtitleStreamEnd => EventKind::SubtitleStreamEnd,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Fan-out publish/subscribe register keyed by [`EventKind`].
///
/// Queues are unbounded so a slow subscriber never blocks the publisher;
/// backpressure is not needed because event volume is bounded by speech
/// rate. Senders whose receiver has been dropped are pruned on publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<EventKind, Vec<mpsc::UnboundedSender<BusEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw subscription: events of any of `kinds` are pushed onto
    /// one shared FIFO queue, in publication order.
    pub fn subscribe_channel(&self, kinds: &[EventKind]) -> mpsc::UnboundedReceiver<BusEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for kind in kinds {
            subscribers.entry(*kind).or_default().push(tx.clone());
        }
        rx
    }

    /// Register an event handler with a dedicated worker task that drains the
    /// subscriber's queue serially. The worker ends when the bus is dropped
    /// or after handling a terminal event it subscribed to.
    pub fn subscribe<F, Fut>(&self, kinds: &[EventKind], mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(BusEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut rx = self.subscribe_channel(kinds);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let done = matches!(
                    event,
                    BusEvent::EndOfStream | BusEvent::SubtitleStreamEnd
                );
                handler(event).await;
                if done {
                    break;
                }
            }
        })
    }

    /// Deliver `event` to every subscriber registered for its kind.
    pub fn publish(&self, event: BusEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = subscribers.get_mut(&event.kind()) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

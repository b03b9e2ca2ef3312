//! Pipeline orchestrators.
//!
//! Two operating modes share the same building blocks but wire them
//! differently:
//!
//! ```text
//! batch:  audio file ─▶ SpeechToText (windowed) ─▶ phrase list
//!                                ─▶ Translator (batched) ─▶ SRT file
//!
//! live:   WordSource ─▶ bus(WordFinal) ─▶ segmenter worker
//!                    ─▶ bus(SubtitleChunk) ─▶ LineTranslator
//!                    ─▶ bus(TranslationDelta/Final) ─▶ stdout renderer
//! ```
//!
//! Batch mode is sequential: one network call outstanding at a time. Live
//! mode runs every stage as a cooperatively scheduled task; per-stage
//! ordering comes from the bus's per-subscriber FIFO queues.

pub mod batch;
pub mod live;

pub use batch::run_batch;
pub use live::run_live;

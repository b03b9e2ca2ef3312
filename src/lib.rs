//! Speech → time-aligned translated subtitles.
//!
//! The pipeline turns spoken audio into subtitle lines in another
//! language, in two operating modes:
//!
//! * **batch** — a pre-recorded file is sliced into upload-sized windows,
//!   transcribed with word timestamps, segmented into subtitle lines, and
//!   translated in validated batches; output is an SRT file.
//! * **live** — a word source publishes finalised words onto an in-process
//!   event bus; the segmenter and a per-line streaming translator consume
//!   and republish, and translated lines appear as the speaker talks.
//!
//! # Module map
//!
//! * [`audio`] — decoding and byte-budgeted window encoding.
//! * [`asr`] — speech-to-text backends and the window-retry loop.
//! * [`segment`] — the word-stream segmenter.
//! * [`translate`] — batch and streaming translators over a chat oracle.
//! * [`bus`] — the publish/subscribe backbone of the live pipeline.
//! * [`subtitle`] — `Word`/`Phrase` data model and SRT I/O.
//! * [`pipeline`] — the two orchestrators.
//! * [`config`] — TOML settings and platform paths.

pub mod asr;
pub mod audio;
pub mod bus;
pub mod config;
pub mod pipeline;
pub mod segment;
pub mod subtitle;
pub mod translate;

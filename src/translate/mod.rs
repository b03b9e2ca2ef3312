//! Translation module.
//!
//! This module provides:
//! * [`Translator`] — async trait implemented by all whole-list translators.
//! * [`BatchTranslator`] — resilient batched translation with bisection retry.
//! * [`LineTranslator`] — per-line streaming translation over the event bus.
//! * [`PassthroughTranslator`] — copies source text; for dry runs.
//! * [`TranslationOracle`] / [`ChatOracle`] — OpenAI-compatible chat backend.
//! * [`ContextWindow`] — bounded FIFO of already-translated lines.
//! * [`TranslateError`] — error variants for translation operations.
//!
//! The oracle is trusted for content but not for structural obedience: it
//! may silently drop, merge, or reorder lines. [`BatchTranslator`] detects
//! this through per-batch identifiers and recovers by bisection; see its
//! module docs.

pub mod batch;
pub mod context;
pub mod oracle;
pub mod passthrough;
pub mod prompt;
pub mod streaming;

pub use batch::BatchTranslator;
pub use context::ContextWindow;
pub use oracle::{BatchRequest, ChatOracle, LineRequest, TranslatedLine, TranslationOracle};
pub use passthrough::PassthroughTranslator;
pub use streaming::LineTranslator;

use async_trait::async_trait;
use thiserror::Error;

use crate::subtitle::Phrase;

/// Placed in `translated_text` when a line cannot be translated, so a
/// failure is visible in the output instead of silently empty.
pub const TRANSLATION_FAILED_MARKER: &str = "[translation failed]";

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors that can occur during translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The response could not be parsed as the expected structure.
    #[error("failed to parse translation response: {0}")]
    Parse(String),

    /// The oracle returned a response with no usable content.
    #[error("translation returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Async trait for translators that fill in a whole phrase list.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Translator>`.
///
/// # Contract
///
/// Mutates each phrase's `translated_text` in place; never reorders, drops,
/// or resizes the slice. On unrecoverable per-line failure the marker
/// [`TRANSLATION_FAILED_MARKER`] is written instead of leaving the field
/// empty — one bad line must not discard the rest.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, phrases: &mut [Phrase]) -> Result<(), TranslateError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Translator>) {}
};

//! Word-stream segmenter — turns a stream of timestamped words into
//! subtitle-line phrases.
//!
//! One decision rule serves both operating modes:
//!
//! * **batch** — [`segment_words`] consumes a whole window's words at once;
//! * **streaming** — [`StreamSegmenter::push`] consumes words one at a time
//!   as a live ASR session finalises them.
//!
//! # Chunking strategy
//!
//! Evaluated after each word is appended to the open phrase buffer:
//!
//! * Always break on sentence-end punctuation (highest priority).
//! * While within the target line length, break when the silence gap to the
//!   next word exceeds the normal threshold.
//! * Past the target length, break on a much shorter silence gap, or when a
//!   single word drags on longer than the long-word threshold — both signal
//!   unnatural pacing worth breaking on.
//! * At the max line length, break unconditionally.
//!
//! As a line grows past a comfortable reading length the rules become
//! progressively more eager to break, capped by a hard maximum so no
//! subtitle line is ever unbounded.

use crate::config::SegmenterConfig;
use crate::subtitle::{Phrase, Word};

// ---------------------------------------------------------------------------
// StreamSegmenter
// ---------------------------------------------------------------------------

/// Incremental segmenter holding one open phrase buffer.
///
/// Words must arrive in strictly increasing time order (guaranteed by
/// upstream ASR ordering). Gap-based rules can only fire once the *next*
/// word is known, so [`push`](Self::push) may emit the previously buffered
/// phrase before appending the new word — a single push can therefore yield
/// up to two phrases (gap close followed by a punctuation close).
pub struct StreamSegmenter {
    cfg: SegmenterConfig,
    buffer: Vec<Word>,
    /// `Some` in streaming mode: monotonic line identifier counter.
    next_id: Option<u64>,
}

impl StreamSegmenter {
    /// Batch-mode segmenter — emitted phrases carry no identifier.
    pub fn new(cfg: SegmenterConfig) -> Self {
        Self {
            cfg,
            buffer: Vec::new(),
            next_id: None,
        }
    }

    /// Streaming-mode segmenter — each emitted phrase gets the next
    /// monotonic identifier, used downstream for translation alignment.
    pub fn with_ids(cfg: SegmenterConfig) -> Self {
        Self {
            cfg,
            buffer: Vec::new(),
            next_id: Some(0),
        }
    }

    /// Feed one word; returns any phrases closed by its arrival.
    pub fn push(&mut self, word: Word) -> Vec<Phrase> {
        // Zero-length words carry no content and would distort gap timing.
        if word.text.is_empty() {
            return Vec::new();
        }

        let mut emitted = Vec::new();

        // Deferred gap rule: the silence between the buffered tail and this
        // word closes the *previous* phrase.
        if let Some(last) = self.buffer.last() {
            let gap = word.start - last.end;
            if self.gap_closes(self.buffer.len(), gap) {
                emitted.push(self.close());
            }
        }

        let long_word = word.duration() > self.cfg.long_word_secs;
        self.buffer.push(word);
        let len = self.buffer.len();

        // Immediate rules, in priority order.
        let ends_sentence = self.ends_with_delimiter(&self.buffer[len - 1].text);
        if ends_sentence
            || len >= self.cfg.max_phrase_len
            || (len > self.cfg.target_phrase_len && long_word)
        {
            emitted.push(self.close());
        }

        emitted
    }

    /// End of input: close any open buffer.
    pub fn finish(&mut self) -> Option<Phrase> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.close())
        }
    }

    /// Number of words currently buffered.
    pub fn pending_words(&self) -> usize {
        self.buffer.len()
    }

    fn gap_closes(&self, buffered: usize, gap: f64) -> bool {
        if buffered <= self.cfg.target_phrase_len {
            gap > self.cfg.silence_gap_secs
        } else {
            gap > self.cfg.silence_gap_short_secs
        }
    }

    fn ends_with_delimiter(&self, text: &str) -> bool {
        self.cfg
            .break_punctuation
            .iter()
            .any(|d| !d.is_empty() && text.ends_with(d.as_str()))
    }

    fn close(&mut self) -> Phrase {
        debug_assert!(!self.buffer.is_empty());

        let start = self.buffer[0].start;
        let end = self.buffer[self.buffer.len() - 1].end;
        let text: String = self.buffer.iter().map(|w| w.text.as_str()).collect();
        self.buffer.clear();

        let mut phrase = Phrase::new(start, end, text);
        if let Some(id) = self.next_id.as_mut() {
            phrase.id = Some(id.to_string());
            *id += 1;
        }

        log::debug!(
            "[{:.1} - {:.1}] {}",
            phrase.start.unwrap_or(0.0),
            phrase.end.unwrap_or(0.0),
            phrase.text
        );
        phrase
    }
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Segment a finite word sequence (one transcription window) into phrases.
pub fn segment_words(words: impl IntoIterator<Item = Word>, cfg: &SegmenterConfig) -> Vec<Phrase> {
    let mut segmenter = StreamSegmenter::new(cfg.clone());
    let mut phrases = Vec::new();
    for word in words {
        phrases.extend(segmenter.push(word));
    }
    phrases.extend(segmenter.finish());
    phrases
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Resilient batched translation with bisection retry.
//!
//! Phrases are translated in fixed-size batches, strictly in order, because
//! each batch's prompt carries the context produced by the previous one.
//! Every batch line gets a short random identifier that the oracle must echo
//! back; any deviation from the exact sent sequence — a dropped, merged,
//! reordered, or invented line — is a contract violation.
//!
//! A violated batch of more than one line is split in half and both halves
//! are re-queued front-loaded, so the first half is retried before anything
//! later. Smaller batches are monotonically more likely to satisfy the
//! contract, so this always terminates; a single line that still fails is
//! marked with [`TRANSLATION_FAILED_MARKER`] instead of looping forever.
//! Timeouts are handled the same way as structural violations.

use std::collections::{HashSet, VecDeque};
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::TranslationConfig;
use crate::subtitle::Phrase;

use super::context::ContextWindow;
use super::oracle::{BatchRequest, TargetLine, TranslatedLine, TranslationOracle};
use super::{TranslateError, Translator, TRANSLATION_FAILED_MARKER};

// ---------------------------------------------------------------------------
// BatchTranslator
// ---------------------------------------------------------------------------

pub struct BatchTranslator {
    oracle: Arc<dyn TranslationOracle>,
    config: TranslationConfig,
}

impl BatchTranslator {
    pub fn new(oracle: Arc<dyn TranslationOracle>, config: &TranslationConfig) -> Self {
        Self {
            oracle,
            config: config.clone(),
        }
    }

    /// Short random identifiers, unique within the batch.
    fn batch_ids(count: usize) -> Vec<String> {
        let mut seen = HashSet::with_capacity(count);
        let mut ids = Vec::with_capacity(count);
        while ids.len() < count {
            let token = Uuid::new_v4().simple().to_string()[..6].to_string();
            if seen.insert(token.clone()) {
                ids.push(token);
            }
        }
        ids
    }

    /// The oracle must echo the sent identifier sequence exactly: same
    /// count, same ids, same order.
    fn aligned(ids: &[String], lines: &[TranslatedLine]) -> bool {
        ids.len() == lines.len() && ids.iter().zip(lines).all(|(id, line)| *id == line.id)
    }
}

#[async_trait]
impl Translator for BatchTranslator {
    async fn translate(&self, phrases: &mut [Phrase]) -> Result<(), TranslateError> {
        if phrases.is_empty() {
            return Ok(());
        }

        let batch_size = self.config.batch_size.max(1);
        let mut context = ContextWindow::new(self.config.context_lines);

        // Pending slices, processed front to back. Bisection pushes halves
        // back onto the front so earlier text is always translated first.
        let mut queue: VecDeque<Range<usize>> = VecDeque::new();
        let mut start = 0;
        while start < phrases.len() {
            let end = (start + batch_size).min(phrases.len());
            queue.push_back(start..end);
            start = end;
        }

        let total = phrases.len();
        let mut done = 0usize;

        while let Some(range) = queue.pop_front() {
            let ids = Self::batch_ids(range.len());
            for (phrase, id) in phrases[range.clone()].iter_mut().zip(&ids) {
                phrase.id = Some(id.clone());
            }

            let request = BatchRequest {
                memory: context.lines().cloned().collect(),
                target: phrases[range.clone()]
                    .iter()
                    .zip(&ids)
                    .map(|(phrase, id)| TargetLine {
                        id: id.clone(),
                        text: phrase.text.clone(),
                    })
                    .collect(),
                extra_context: self.config.extra_context.clone(),
            };

            let lines = match self.oracle.translate_batch(&request).await {
                Ok(lines) => {
                    if Self::aligned(&ids, &lines) {
                        Some(lines)
                    } else {
                        log::warn!(
                            "batch broke line alignment: sent {} lines, got {}",
                            ids.len(),
                            lines.len()
                        );
                        None
                    }
                }
                Err(e) => {
                    log::warn!("batch of {} lines failed: {e}", range.len());
                    None
                }
            };

            match lines {
                Some(lines) => {
                    for (phrase, line) in phrases[range.clone()].iter_mut().zip(lines) {
                        phrase.translated_text = line.translated_text;
                    }
                    for phrase in &phrases[range] {
                        context.push(
                            phrase.id.clone().unwrap_or_default(),
                            phrase.text.clone(),
                            phrase.translated_text.clone(),
                        );
                        done += 1;
                    }
                    log::info!("translated {done}/{total} lines");
                }
                None if range.len() > 1 => {
                    let mid = range.start + range.len() / 2;
                    queue.push_front(mid..range.end);
                    queue.push_front(range.start..mid);
                }
                None => {
                    // Single line, non-retryable: flag it and move on so one
                    // bad line never discards the rest of the file.
                    log::error!("line untranslatable, flagging: {}", phrases[range.start].text);
                    phrases[range.start].translated_text = TRANSLATION_FAILED_MARKER.to_string();
                    done += 1;
                }
            }
        }

        // Identifiers are per-batch scratch and must never reach output.
        for phrase in phrases.iter_mut() {
            phrase.id = None;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Window-retry / resegmentation loop.
//!
//! A payload-limited transcription service sees the source one window at a
//! time, and a window boundary can land mid-sentence. After transcribing
//! each window this loop decides where the next window starts:
//!
//! 1. No phrases (silence) — skip ahead to the window end.
//! 2. Clear trailing silence after the last phrase — the window ended
//!    cleanly; accept everything and advance (with a small backward pad so
//!    no trailing audio is lost).
//! 3. Otherwise the window likely cut a sentence: accept all phrases except
//!    the last and restart from the rejected phrase's start, giving the cut
//!    sentence more trailing context on the retry. A window filled by one
//!    single unbroken phrase is accepted as-is — re-requesting it would
//!    fetch the same window forever.
//!
//! The loop terminates: the start time never decreases, is bounded by the
//! source duration, and every iteration either finalises a phrase or moves
//! the start strictly forward.

use async_trait::async_trait;

use crate::audio::{AudioSource, WindowPlanner};
use crate::config::{SegmenterConfig, WindowConfig};
use crate::segment::segment_words;
use crate::subtitle::{Phrase, Word};

use super::AsrError;

// ---------------------------------------------------------------------------
// WindowTranscriber
// ---------------------------------------------------------------------------

/// Transcribes one encoded window into words with window-relative
/// timestamps, in chronological order.
#[async_trait]
pub trait WindowTranscriber: Send + Sync {
    async fn transcribe_window(
        &self,
        wav_bytes: &[u8],
        prompt: &str,
        language: &str,
    ) -> Result<Vec<Word>, AsrError>;
}

// ---------------------------------------------------------------------------
// transcribe_windowed
// ---------------------------------------------------------------------------

/// Drive `transcriber` across the whole of `source`, returning the full
/// ordered phrase list.
pub async fn transcribe_windowed(
    source: &AudioSource,
    transcriber: &dyn WindowTranscriber,
    window_cfg: &WindowConfig,
    segmenter_cfg: &SegmenterConfig,
    prompt: &str,
    language: &str,
) -> Result<Vec<Phrase>, AsrError> {
    let planner = WindowPlanner::new(window_cfg.target_bytes);
    let mut all_phrases: Vec<Phrase> = Vec::new();
    let mut start_secs = 0.0f64;

    loop {
        let window = planner.next_window(source, start_secs)?;
        log::info!(
            "transcribing audio: {:.1}s to {:.1}s",
            window.start_secs,
            window.end_secs
        );

        let words = transcriber
            .transcribe_window(&window.wav_bytes, prompt, language)
            .await?;

        // Service timestamps are window-relative; shift onto the source
        // timeline before segmenting.
        let words = words
            .into_iter()
            .map(|w| Word::new(w.start + window.start_secs, w.end + window.start_secs, w.text));
        let mut phrases = segment_words(words, segmenter_cfg);

        if phrases.is_empty() {
            // No speech detected — not an error, move to the next window.
            start_secs = window.end_secs;
        } else if window.is_final {
            // Nothing follows this window, so nothing can be cut in half.
            all_phrases.append(&mut phrases);
            start_secs = window.end_secs;
        } else {
            let last_start = phrases.last().and_then(|p| p.start).unwrap_or(start_secs);
            let last_end = phrases.last().and_then(|p| p.end).unwrap_or(start_secs);

            if window.end_secs - last_end > window_cfg.sentence_boundary_secs {
                // The window didn't cut mid-sentence.
                all_phrases.append(&mut phrases);
                start_secs = (window.end_secs - window_cfg.start_pad_secs).max(last_end);
            } else if phrases.len() == 1 && last_start - window.start_secs < 1.0 {
                // One unbroken phrase fills the window; re-requesting the
                // same slice would loop forever, so accept it as-is.
                all_phrases.append(&mut phrases);
                start_secs = last_end;
            } else {
                // The window cut a sentence. Re-transcribe from the start
                // of the cut phrase, padded back but never before the end
                // of the previous (accepted) phrase.
                let penultimate_end = phrases
                    .len()
                    .checked_sub(2)
                    .and_then(|i| phrases[i].end);

                phrases.pop();
                all_phrases.append(&mut phrases);

                start_secs = match penultimate_end {
                    Some(end) => (last_start - window_cfg.start_pad_secs).max(end),
                    None => last_start,
                };
            }
        }

        if window.is_final {
            break;
        }
    }

    log::info!("transcription complete: {} phrases", all_phrases.len());
    Ok(all_phrases)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 2-second windows at 16 kHz.
    fn window_cfg() -> WindowConfig {
        WindowConfig {
            target_bytes: 64_000,
            ..WindowConfig::default()
        }
    }

    fn source_secs(secs: f64) -> AudioSource {
        AudioSource::new(vec![0.1; (secs * 16_000.0) as usize], 16_000)
    }

    /// Scripted transcriber: returns one pre-baked word list per call, in
    /// order. Records the windows it was asked for.
    struct ScriptedTranscriber {
        responses: Mutex<std::vec::IntoIter<Vec<Word>>>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedTranscriber {
        fn new(responses: Vec<Vec<Word>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WindowTranscriber for ScriptedTranscriber {
        async fn transcribe_window(
            &self,
            wav_bytes: &[u8],
            _prompt: &str,
            _language: &str,
        ) -> Result<Vec<Word>, AsrError> {
            self.calls.lock().unwrap().push(wav_bytes.len());
            Ok(self.responses.lock().unwrap().next().unwrap_or_default())
        }
    }

    fn w(start: f64, end: f64, text: &str) -> Word {
        Word::new(start, end, text)
    }

    /// Silence in every window: the loop advances window by window and
    /// terminates with no phrases.
    #[tokio::test]
    async fn silence_advances_to_end() {
        let source = source_secs(5.0); // windows: [0,2) [2,4) [4,5)
        let transcriber = ScriptedTranscriber::new(vec![vec![], vec![], vec![]]);

        let phrases = transcribe_windowed(
            &source,
            &transcriber,
            &window_cfg(),
            &SegmenterConfig::default(),
            "",
            "ja",
        )
        .await
        .unwrap();

        assert!(phrases.is_empty());
        assert_eq!(transcriber.call_count(), 3);
    }

    /// A window with clear trailing silence is accepted whole and the next
    /// window starts at the padded end.
    #[tokio::test]
    async fn clean_window_end_accepts_all_phrases() {
        let source = source_secs(3.0); // windows: [0,2) then final
        let transcriber = ScriptedTranscriber::new(vec![
            // Ends at 1.2 s; 0.8 s of trailing silence > 0.35 s boundary.
            vec![w(0.0, 0.5, "こんにちは。"), w(0.8, 1.2, "はい。")],
            vec![w(0.2, 0.5, "続き。")], // relative to restart at 1.8 s
        ]);

        let phrases = transcribe_windowed(
            &source,
            &transcriber,
            &window_cfg(),
            &SegmenterConfig::default(),
            "",
            "ja",
        )
        .await
        .unwrap();

        assert_eq!(phrases.len(), 3);
        assert_eq!(phrases[0].text, "こんにちは。");
        assert_eq!(phrases[1].text, "はい。");
        // Next window re-anchored to end - 0.2 pad = 1.8 s; the second
        // response's words land at 2.0 s absolute.
        assert_eq!(phrases[2].start, Some(2.0));
    }

    /// A sentence cut by the window boundary is rejected and re-transcribed
    /// from its start with more trailing context.
    #[tokio::test]
    async fn cut_sentence_is_retranscribed() {
        let source = source_secs(4.0); // windows: [0,2) [*,*) final
        let transcriber = ScriptedTranscriber::new(vec![
            // Second phrase runs right up to the window end (gap 0.1 s
            // < 0.35 s boundary) — it was cut.
            vec![w(0.0, 0.5, "最初。"), w(1.0, 1.9, "切れた")],
            // Retry window starts at max(1.0 - 0.2, 0.5) = 0.8 s; the full
            // sentence now fits.
            vec![w(0.2, 1.1, "切れた"), w(1.1, 1.5, "文。")],
            // Trailing window is silent.
            vec![],
        ]);

        let phrases = transcribe_windowed(
            &source,
            &transcriber,
            &window_cfg(),
            &SegmenterConfig::default(),
            "",
            "ja",
        )
        .await
        .unwrap();

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].text, "最初。");
        assert_eq!(phrases[1].text, "切れた文。");
        assert_eq!(phrases[1].start, Some(1.0)); // 0.8 + 0.2 relative
        assert_eq!(transcriber.call_count(), 3);
    }

    /// One unbroken phrase filling the whole window would loop forever if
    /// rejected; it must be accepted and the loop must advance past it.
    #[tokio::test]
    async fn degenerate_single_phrase_window_is_accepted() {
        let source = source_secs(4.0);
        let transcriber = ScriptedTranscriber::new(vec![
            // A single phrase spanning the entire window, no punctuation,
            // no gaps, running into the boundary.
            vec![w(0.0, 1.0, "ずっと"), w(1.0, 1.95, "続く")],
            // Next window starts at 1.95 s.
            vec![w(0.1, 0.5, "おわり。")],
            // Trailing window is silent.
            vec![],
        ]);

        let phrases = transcribe_windowed(
            &source,
            &transcriber,
            &window_cfg(),
            &SegmenterConfig::default(),
            "",
            "ja",
        )
        .await
        .unwrap();

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].text, "ずっと続く");
        assert_eq!(phrases[1].start, Some(2.05)); // 1.95 + 0.1
        assert_eq!(transcriber.call_count(), 3);
    }

    /// The final window accepts everything — nothing follows it that could
    /// have cut a sentence.
    #[tokio::test]
    async fn final_window_accepts_trailing_phrase() {
        let source = source_secs(1.5); // single final window
        let transcriber = ScriptedTranscriber::new(vec![vec![
            w(0.0, 0.4, "一。"),
            w(0.6, 1.45, "途中まで"), // runs into the source end
        ]]);

        let phrases = transcribe_windowed(
            &source,
            &transcriber,
            &window_cfg(),
            &SegmenterConfig::default(),
            "",
            "ja",
        )
        .await
        .unwrap();

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[1].text, "途中まで");
        assert_eq!(transcriber.call_count(), 1);
    }
}

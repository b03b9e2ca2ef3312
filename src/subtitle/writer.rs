//! SRT serialisation.
//!
//! Output format: sequential numbered blocks of
//!
//! ```text
//! 1
//! 00:00:01,500 --> 00:00:03,200
//! translated text
//!
//! ```
//!
//! The end time of each line is extended by a small pad for readability,
//! capped at the next line's start so lines never overlap.

use std::path::Path;

use anyhow::Result;

use super::Phrase;

/// How long to extend each subtitle line by, in seconds.
const EXTEND_SECS: f64 = 0.2;

/// Render `phrases` as an SRT document.
///
/// Phrases without timestamps are skipped with a warning — they cannot be
/// placed on the timeline.
pub fn write_srt(phrases: &[Phrase]) -> String {
    let mut blocks = Vec::with_capacity(phrases.len());

    for (i, phrase) in phrases.iter().enumerate() {
        let (start, end) = match (phrase.start, phrase.end) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                log::warn!("skipping subtitle line without timestamps: {:?}", phrase.text);
                continue;
            }
        };

        // Extend the end time slightly, but never into the next line.
        let mut end = end + EXTEND_SECS;
        if let Some(next_start) = phrases.get(i + 1).and_then(|p| p.start) {
            end = end.min(next_start);
        }

        blocks.push(format!(
            "{}\n{} --> {}\n{}",
            blocks.len() + 1,
            format_timestamp(start),
            format_timestamp(end),
            phrase.translated_text
        ));
    }

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Render `phrases` as SRT and write the document to `path`.
pub fn write_srt_to(phrases: &[Phrase], path: &Path) -> Result<()> {
    let output = write_srt(phrases);
    std::fs::write(path, output)?;
    log::info!("wrote {} subtitle lines to {}", phrases.len(), path.display());
    Ok(())
}

/// Format seconds as `HH:MM:SS,mmm`.
fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(start: f64, end: f64, text: &str) -> Phrase {
        let mut p = Phrase::new(start, end, "");
        p.translated_text = text.into();
        p
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_timestamp(3661.042), "01:01:01,042");
    }

    #[test]
    fn blocks_are_numbered_and_separated() {
        let phrases = vec![translated(0.0, 1.0, "hello"), translated(2.0, 3.0, "world")];
        let out = write_srt(&phrases);
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("1\n"));
        assert!(blocks[1].starts_with("2\n"));
        assert!(blocks[0].contains("hello"));
        assert!(blocks[1].contains("world"));
    }

    /// The readability pad must not run into the next line's start.
    #[test]
    fn end_extension_capped_at_next_start() {
        let phrases = vec![translated(0.0, 1.0, "a"), translated(1.1, 2.0, "b")];
        let out = write_srt(&phrases);
        // 1.0 + 0.2 would be 1.2, but the next line starts at 1.1.
        assert!(out.contains("00:00:00,000 --> 00:00:01,100"));
    }

    #[test]
    fn document_ends_with_newline() {
        let phrases = vec![translated(0.0, 1.0, "hello")];
        assert!(write_srt(&phrases).ends_with('\n'));
        assert_eq!(write_srt(&[]), "");
    }

    #[test]
    fn last_line_gets_full_extension() {
        let phrases = vec![translated(0.0, 1.0, "solo")];
        let out = write_srt(&phrases);
        assert!(out.contains("00:00:00,000 --> 00:00:01,200"));
    }

    /// A phrase without timestamps cannot be placed and is skipped; the
    /// numbering of the remaining blocks stays sequential.
    #[test]
    fn skips_lines_without_timestamps() {
        let mut broken = Phrase::default();
        broken.translated_text = "lost".into();
        let phrases = vec![translated(0.0, 1.0, "kept"), broken, translated(2.0, 3.0, "also kept")];

        let out = write_srt(&phrases);
        assert!(!out.contains("lost"));
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].starts_with("2\n"));
    }
}

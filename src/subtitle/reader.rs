//! Tolerant SRT parser.
//!
//! Used by the file-replay ASR backend: an existing subtitle file already
//! contains phrase-level lines with timestamps, so it can feed the
//! translation stage directly without audio or segmentation.

use std::path::Path;

use thiserror::Error;

use super::Phrase;

#[derive(Debug, Error)]
pub enum SrtParseError {
    #[error("failed to read subtitle file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed timestamp line {line}: {text:?}")]
    BadTimestamp { line: usize, text: String },
}

/// Parse an SRT file into untranslated phrases (the subtitle text lands in
/// `Phrase::text`).
///
/// The parser is deliberately lenient: CRLF line endings, a UTF-8 BOM, and
/// multi-line subtitle text are all accepted. Index lines are not verified
/// against their position — only timestamps and text matter.
pub fn read_srt(path: &Path) -> Result<Vec<Phrase>, SrtParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_srt(&content)
}

fn parse_srt(content: &str) -> Result<Vec<Phrase>, SrtParseError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut phrases = Vec::new();

    let mut lines = content.lines().enumerate().peekable();
    while let Some((line_no, line)) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // An index line is a bare number; the timestamp line follows it.
        // Accept blocks that omit the index entirely.
        let timestamp_line = if line.contains("-->") {
            (line_no, line)
        } else {
            match lines.next() {
                Some((n, l)) => (n, l.trim()),
                None => break,
            }
        };

        let (start, end) = parse_timestamps(timestamp_line.1).ok_or_else(|| {
            SrtParseError::BadTimestamp {
                line: timestamp_line.0 + 1,
                text: timestamp_line.1.to_string(),
            }
        })?;

        // Text runs until the next blank line.
        let mut text_lines = Vec::new();
        while let Some((_, l)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
            text_lines.push(l.trim().to_string());
        }

        phrases.push(Phrase::new(start, end, text_lines.join(" ")));
    }

    Ok(phrases)
}

/// Parse `HH:MM:SS,mmm --> HH:MM:SS,mmm` into (start, end) seconds.
fn parse_timestamps(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

fn parse_timestamp(ts: &str) -> Option<f64> {
    // Some files use '.' for the millisecond separator.
    let ts = ts.replace('.', ",");
    let (hms, ms) = ts.split_once(',')?;
    let mut parts = hms.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    let ms: f64 = ms.trim().parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s + ms / 1000.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

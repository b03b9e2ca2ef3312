//! Audio Window Manager — slices a decoded source into successive time
//! windows sized to a transcription backend's upload limit.
//!
//! The window duration is derived purely from the byte budget and the fixed
//! PCM encoding rate, never from the audio content; re-anchoring the next
//! window's start to avoid severing a sentence is the transcription loop's
//! job (see [`crate::asr::windowed`]), not this module's.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{AudioError, AudioSource};

// ---------------------------------------------------------------------------
// AudioWindow
// ---------------------------------------------------------------------------

/// One encoded upload window.
#[derive(Debug, Clone)]
pub struct AudioWindow {
    /// 16-bit mono WAV bytes covering `[start_secs, end_secs)`.
    pub wav_bytes: Vec<u8>,
    /// Window start in seconds (caller-supplied).
    pub start_secs: f64,
    /// Window end in seconds, clamped to the source duration.
    pub end_secs: f64,
    /// `true` when this window reaches the end of the source.
    pub is_final: bool,
}

// ---------------------------------------------------------------------------
// WindowPlanner
// ---------------------------------------------------------------------------

/// Computes and encodes upload windows. Stateless between calls: the only
/// carried value is the caller-supplied start time.
#[derive(Debug, Clone)]
pub struct WindowPlanner {
    target_bytes: u64,
}

impl WindowPlanner {
    pub fn new(target_bytes: u64) -> Self {
        Self { target_bytes }
    }

    /// Window duration in seconds for `source`'s encoding rate.
    ///
    /// PCM16 mono: `bytes_per_second = sample_rate * 2`.
    pub fn window_duration_secs(&self, source: &AudioSource) -> f64 {
        let bytes_per_second = (source.sample_rate as u64 * 2).max(1);
        self.target_bytes as f64 / bytes_per_second as f64
    }

    /// Encode the next window starting at `start_secs`.
    ///
    /// `end_secs = min(start + duration, total)`;
    /// `is_final = (end_secs == total)`.
    pub fn next_window(
        &self,
        source: &AudioSource,
        start_secs: f64,
    ) -> Result<AudioWindow, AudioError> {
        let total = source.duration_secs();
        let end_secs = (start_secs + self.window_duration_secs(source)).min(total);
        let is_final = end_secs >= total;

        let wav_bytes = encode_wav(source.slice_secs(start_secs, end_secs), source.sample_rate)?;

        log::debug!(
            "encoded window [{start_secs:.1}s - {end_secs:.1}s) ({} bytes, final: {is_final})",
            wav_bytes.len()
        );

        Ok(AudioWindow {
            wav_bytes,
            start_secs,
            end_secs,
            is_final,
        })
    }
}

/// Encode mono f32 samples as an in-memory 16-bit WAV.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut buffer, spec).map_err(|e| AudioError::Encode(e.to_string()))?;
        for &sample in samples {
            let sample = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample)
                .map_err(|e| AudioError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }

    Ok(buffer.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn source_secs(secs: f64) -> AudioSource {
        AudioSource::new(vec![0.1; (secs * 16_000.0) as usize], 16_000)
    }

    #[test]
    fn duration_follows_byte_budget() {
        // 64 000 bytes at 16 kHz PCM16 mono (32 000 B/s) = 2 s windows.
        let planner = WindowPlanner::new(64_000);
        let source = source_secs(10.0);
        assert!((planner.window_duration_secs(&source) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn end_clamped_and_final_flag() {
        let planner = WindowPlanner::new(64_000); // 2 s windows
        let source = source_secs(3.0);

        let first = planner.next_window(&source, 0.0).unwrap();
        assert_eq!(first.end_secs, 2.0);
        assert!(!first.is_final);

        let last = planner.next_window(&source, 2.0).unwrap();
        assert_eq!(last.end_secs, 3.0);
        assert!(last.is_final);
    }

    /// Successive windows starting at 0 cover [0, T) with no gap and
    /// eventually report `is_final`.
    #[test]
    fn windows_cover_entire_source() {
        let planner = WindowPlanner::new(64_000); // 2 s windows
        let source = source_secs(7.3);

        let mut start = 0.0;
        let mut covered_to = 0.0;
        let mut windows = 0;
        loop {
            let window = planner.next_window(&source, start).unwrap();
            assert!(window.start_secs <= covered_to, "gap before window");
            covered_to = window.end_secs;
            windows += 1;
            if window.is_final {
                break;
            }
            start = window.end_secs;
            assert!(windows < 100, "non-terminating window loop");
        }

        assert_eq!(covered_to, source.duration_secs());
        assert_eq!(windows, 4); // 2 + 2 + 2 + 1.3 seconds
    }

    /// The encoded payload stays within the byte budget (modulo WAV header).
    #[test]
    fn encoded_size_within_budget() {
        let planner = WindowPlanner::new(64_000);
        let source = source_secs(10.0);
        let window = planner.next_window(&source, 0.0).unwrap();
        assert!(window.wav_bytes.len() <= 64_000 + 44);
        // And it is a valid WAV.
        let reader = hound::WavReader::new(Cursor::new(window.wav_bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.len(), 32_000); // 2 s of samples
    }

    #[test]
    fn window_past_end_is_empty_and_final() {
        let planner = WindowPlanner::new(64_000);
        let source = source_secs(1.0);
        let window = planner.next_window(&source, 5.0).unwrap();
        assert!(window.is_final);
        assert_eq!(window.end_secs, 1.0);
        let reader = hound::WavReader::new(Cursor::new(window.wav_bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }
}

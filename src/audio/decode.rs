//! Media decoding via `symphonia`.
//!
//! Everything downstream works on mono f32 PCM; multi-channel sources are
//! downmixed by channel averaging during decode. An undecodable source is
//! fatal for the whole transcription job — there is nothing to transcribe.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors raised while decoding or encoding audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    /// The container or codec could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// WAV window encoding failed (should not happen for in-memory writes).
    #[error("failed to encode audio window: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// AudioSource
// ---------------------------------------------------------------------------

/// Fully decoded mono audio held in memory.
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Mono f32 PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total duration of the source in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples covering `[start_secs, end_secs)`, clamped to the source.
    pub fn slice_secs(&self, start_secs: f64, end_secs: f64) -> &[f32] {
        let to_index = |secs: f64| {
            ((secs * self.sample_rate as f64).round() as usize).min(self.samples.len())
        };
        let start = to_index(start_secs.max(0.0));
        let end = to_index(end_secs.max(0.0)).max(start);
        &self.samples[start..end]
    }
}

// ---------------------------------------------------------------------------
// decode_file
// ---------------------------------------------------------------------------

/// Decode `path` into a mono [`AudioSource`].
///
/// Corrupt packets are skipped with a warning; any other decoder error
/// aborts the decode.
pub fn decode_file(path: &Path) -> Result<AudioSource, AudioError> {
    let src = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("probe failed for {}: {e}", path.display())))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("missing default audio track".into()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("decoder init failed: {e}")))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut samples = track
        .codec_params
        .n_frames
        .and_then(|n| usize::try_from(n).ok())
        .map(Vec::with_capacity)
        .unwrap_or_default();

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = sample_rate.or(Some(spec.rate));
                let channels = spec.channels.count();

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);

                if channels <= 1 {
                    samples.extend_from_slice(buf.samples());
                } else {
                    for frame in buf.samples().chunks_exact(channels) {
                        let sum: f32 = frame.iter().copied().sum();
                        samples.push(sum / channels as f32);
                    }
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("skipping corrupt packet: {e}");
            }
            Err(e) => {
                return Err(AudioError::Decode(format!(
                    "decode error for {}: {e}",
                    path.display()
                )));
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| AudioError::Decode(format!("missing sample rate for {}", path.display())))?;

    log::info!(
        "decoded {}: {} samples at {} Hz ({:.1} s)",
        path.display(),
        samples.len(),
        sample_rate,
        samples.len() as f64 / sample_rate as f64
    );

    Ok(AudioSource::new(samples, sample_rate))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_samples() {
        let source = AudioSource::new(vec![0.0; 32_000], 16_000);
        assert!((source.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn slice_is_clamped_to_source() {
        let source = AudioSource::new(vec![0.0; 16_000], 16_000);
        assert_eq!(source.slice_secs(0.0, 0.5).len(), 8_000);
        assert_eq!(source.slice_secs(0.5, 10.0).len(), 8_000);
        assert_eq!(source.slice_secs(5.0, 10.0).len(), 0);
    }

    /// Decode a WAV file we wrote ourselves and verify shape.
    #[test]
    fn decodes_wav_written_by_hound() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..16_000u32 {
            let t = i as f32 / 16_000.0;
            let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
            writer.write_sample((sample * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let source = decode_file(&path).expect("decode");
        assert_eq!(source.sample_rate, 16_000);
        assert_eq!(source.samples.len(), 16_000);
        assert!((source.duration_secs() - 1.0).abs() < 1e-6);
        // Not silence.
        assert!(source.samples.iter().any(|s| s.abs() > 0.1));
    }

    /// Stereo input is downmixed to mono.
    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("stereo.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8_000 {
            writer.write_sample(16_384i16).unwrap(); // left
            writer.write_sample(-16_384i16).unwrap(); // right
        }
        writer.finalize().unwrap();

        let source = decode_file(&path).expect("decode");
        assert_eq!(source.samples.len(), 8_000);
        // L and R cancel out under averaging.
        assert!(source.samples.iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = decode_file(Path::new("/nonexistent/audio.mp3"));
        assert!(matches!(result, Err(AudioError::Io(_))));
    }
}

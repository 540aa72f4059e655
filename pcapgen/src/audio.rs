//! Waveform input.
//!
//! A [`Waveform`] is mono, normalized to [-1.0, 1.0] and already at the
//! codec rate. Nothing here resamples: a file at any other rate is rejected.
//! Multi-channel input keeps channel 0 only (selection, not averaging).

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::info;

use crate::codec::{SAMPLES_PER_FRAME, SAMPLE_RATE};
use crate::error::{InputError, PcapGenError};

/// Mono waveform ready for encoding.
#[derive(Debug, Clone)]
pub struct Waveform {
    // ---
    samples: Vec<f32>,
    sample_rate: u32,
    original_channels: u16,
}

impl Waveform {
    // ---
    /// Builds a waveform from interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if:
    /// - `sample_rate` is not 8000 Hz
    /// - `channels` is zero
    /// - the sample count is not a multiple of `channels`
    pub fn new(interleaved: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, PcapGenError> {
        // ---
        if sample_rate != SAMPLE_RATE {
            return Err(InputError::UnsupportedSampleRate {
                actual: sample_rate,
                expected: SAMPLE_RATE,
            }
            .into());
        }

        if channels == 0 {
            return Err(InputError::NoChannels.into());
        }

        if interleaved.len() % channels as usize != 0 {
            return Err(InputError::MisalignedChannels {
                samples: interleaved.len(),
                channels,
            }
            .into());
        }

        let samples = if channels > 1 {
            select_first_channel(&interleaved, channels as usize)
        } else {
            interleaved
        };

        Ok(Self {
            samples,
            sample_rate,
            original_channels: channels,
        })
    }

    /// Builds a waveform from mono samples.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, PcapGenError> {
        // ---
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count of the source before channel selection.
    pub fn original_channels(&self) -> u16 {
        self.original_channels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        // ---
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns the number of complete frames.
    pub fn frame_count(&self) -> usize {
        // ---
        self.samples.len() / SAMPLES_PER_FRAME
    }
}

/// Reads a WAV file into a [`Waveform`].
///
/// Integer PCM of any bit depth is normalized by its full scale
/// (16-bit samples are divided by 32768); 32-bit float is taken as is.
///
/// # Errors
///
/// Returns error if:
/// - File cannot be opened or decoded
/// - Sample format is unsupported
/// - The file is not 8000 Hz (see [`Waveform::new`])
///
/// # Example
///
/// ```no_run
/// use pcapgen::audio::read_wav;
///
/// let waveform = read_wav("voice.wav").unwrap();
/// println!("Duration: {:.2}s", waveform.duration_secs());
/// ```
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    // ---
    let path = path.as_ref();
    info!("Reading WAV file: {}", path.display());

    let mut reader = WavReader::open(path)
        .with_context(|| format!("failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    info!(
        "WAV format: {}Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    // Reject before decoding any samples
    if spec.sample_rate != SAMPLE_RATE {
        return Err(PcapGenError::from(InputError::UnsupportedSampleRate {
            actual: spec.sample_rate,
            expected: SAMPLE_RATE,
        }))
        .with_context(|| format!("cannot use {}", path.display()));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, bits @ 8..=32) => {
            let full_scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to read {bits}-bit PCM WAV samples"))?
        }

        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read 32-bit float WAV samples")?,

        (SampleFormat::Int, bits) => {
            anyhow::bail!("unsupported integer PCM WAV format: {}-bit", bits);
        }

        (SampleFormat::Float, bits) => {
            anyhow::bail!(
                "unsupported float WAV format: {}-bit (only 32-bit float is supported)",
                bits
            );
        }
    };

    info!("Read {} samples from file", interleaved.len());

    let waveform = Waveform::new(interleaved, spec.sample_rate, spec.channels)
        .with_context(|| format!("cannot use {}", path.display()))?;

    if waveform.original_channels() > 1 {
        info!(
            "Kept channel 0 of {} ({} samples)",
            waveform.original_channels(),
            waveform.len()
        );
    }

    Ok(waveform)
}

/// Keeps the first channel of interleaved audio.
fn select_first_channel(samples: &[f32], channels: usize) -> Vec<f32> {
    // ---
    samples.iter().step_by(channels).copied().collect()
}

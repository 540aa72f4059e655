//! Error types for the capture pipeline.

use std::io;
use thiserror::Error;

/// Errors surfaced by the capture pipeline.
///
/// Every error terminates the run; nothing is retried.
#[derive(Debug, Error)]
pub enum PcapGenError {
    /// The waveform or configuration cannot be turned into a capture.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The output sink rejected the global header or a record.
    #[error("failed to write capture output: {0}")]
    IoWrite(#[source] io::Error),
}

/// Reasons an input is rejected before any encoding happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unsupported sample rate: {actual} Hz (expected {expected} Hz, resampling is not performed)")]
    UnsupportedSampleRate { actual: u32, expected: u32 },

    #[error("waveform must have at least one channel")]
    NoChannels,

    #[error("{samples} interleaved samples do not divide evenly into {channels} channels")]
    MisalignedChannels { samples: usize, channels: u16 },

    #[error("invalid MAC address '{0}' (expected six colon-separated hex octets)")]
    InvalidMacAddress(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PcapGenError {
    // ---
    /// Returns true for rejections of the input rather than sink failures.
    pub fn is_invalid_input(&self) -> bool {
        // ---
        matches!(self, PcapGenError::InvalidInput(_))
    }
}

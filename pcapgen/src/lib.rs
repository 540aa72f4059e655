//! PCMU/RTP capture synthesis.
//!
//! Turns a mono 8 kHz waveform into a libpcap file holding one simulated
//! RTP voice stream, ready to be replayed by SIP scenario players or opened
//! in packet analyzers.
//!
//! The pipeline is strictly linear:
//!
//! ```text
//! Waveform -> codec::encode -> RtpPacketizer -> FrameBuilder -> CaptureWriter
//! ```

pub mod audio;
pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod packetizer;

pub use audio::{read_wav, Waveform};
pub use capture::{CaptureTimestamp, CaptureWriter};
pub use config::{MacAddr, PipelineConfig};
pub use error::{InputError, PcapGenError};
pub use frame::{FrameBuilder, LinkFrame};
pub use packetizer::{RtpPacketizer, TailPolicy};
pub use rtp_pcap_common::{MetricsContext, RtpPacket};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{error, info, warn};

/// Outcome of a successful capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    // ---
    /// RTP packets (pcap records) written
    pub frames_written: u64,

    /// Bytes written, global header included
    pub bytes_written: u64,

    /// Trailing samples that did not fill a frame and were discarded
    pub samples_dropped: usize,
}

/// Encodes `waveform` and writes the complete capture to `sink`.
///
/// An empty waveform produces a capture holding only the global header.
///
/// # Errors
///
/// - `InvalidInput` if `config` fails validation (nothing is written)
/// - `IoWrite` if the sink rejects the header or any record
pub fn generate_capture<W: Write>(
    waveform: &Waveform,
    config: &PipelineConfig,
    sink: W,
    metrics: &MetricsContext,
) -> Result<CaptureSummary, PcapGenError> {
    // ---
    config.validate()?;

    let encode_timer = metrics.encode_seconds.start_timer();
    let encoded = codec::encode(waveform.samples());
    encode_timer.observe_duration();
    metrics.samples_encoded_total.inc_by(encoded.len() as u64);

    let packetizer = RtpPacketizer::new(config);
    let samples_dropped = packetizer.dropped_samples(encoded.len());
    if samples_dropped > 0 {
        warn!(
            "Dropping last {} samples: shorter than one {}-sample frame",
            samples_dropped, config.frame_samples
        );
        metrics.samples_dropped_total.inc_by(samples_dropped as u64);
    } else if config.tail_policy == TailPolicy::PadWithSilence
        && encoded.len() % config.frame_samples != 0
    {
        warn!(
            "Padding last frame: {} samples -> {}",
            encoded.len() % config.frame_samples,
            config.frame_samples
        );
    }

    let builder = FrameBuilder::new(config);
    let frame_micros = config.frame_duration_micros();

    let write_timer = metrics.capture_write_seconds.start_timer();
    let mut writer = CaptureWriter::new(sink)?;

    for (index, packet) in packetizer.packets(&encoded).enumerate() {
        let frame = builder.build(&packet);
        let timestamp = CaptureTimestamp::for_frame(config.start_time, index as u64, frame_micros);
        writer.write_frame(&frame, timestamp)?;
        metrics.packets_written_total.inc();
    }

    writer.flush()?;
    write_timer.observe_duration();
    metrics.bytes_written_total.inc_by(writer.bytes_written());

    Ok(CaptureSummary {
        frames_written: writer.frames_written(),
        bytes_written: writer.bytes_written(),
        samples_dropped,
    })
}

/// Writes the capture for `waveform` to a file at `path`.
///
/// On failure the partially written file is removed, so a capture file at
/// `path` always holds a complete stream.
pub fn write_capture_file<P: AsRef<Path>>(
    path: P,
    waveform: &Waveform,
    config: &PipelineConfig,
    metrics: &MetricsContext,
) -> Result<CaptureSummary, PcapGenError> {
    // ---
    let path = path.as_ref();

    // Validate before touching the filesystem
    config.validate()?;

    let file = File::create(path).map_err(PcapGenError::IoWrite)?;

    write_capture_to(path, BufWriter::new(file), waveform, config, metrics)
}

/// Runs the pipeline into `sink`, which writes the file at `path`.
///
/// Removes `path` if the run fails.
fn write_capture_to<W: Write>(
    path: &Path,
    sink: W,
    waveform: &Waveform,
    config: &PipelineConfig,
    metrics: &MetricsContext,
) -> Result<CaptureSummary, PcapGenError> {
    // ---
    match generate_capture(waveform, config, sink, metrics) {
        Ok(summary) => {
            info!(
                "Generated {}: {} packets, {} bytes",
                path.display(),
                summary.frames_written,
                summary.bytes_written
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(path) {
                error!(
                    "Failed to remove incomplete capture {}: {}",
                    path.display(),
                    remove_err
                );
            }
            Err(e)
        }
    }
}

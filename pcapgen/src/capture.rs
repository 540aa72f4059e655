//! libpcap capture file writer.
//!
//! Classic pcap format, written little-endian (magic bytes `d4 c3 b2 a1`):
//!
//! ```text
//! global header (24): magic u32 | major u16 | minor u16 | thiszone i32
//!                     | sigfigs u32 | snaplen u32 | network u32
//! record header (16): ts_sec u32 | ts_usec u32 | incl_len u32 | orig_len u32
//! ```
//!
//! Every record is assembled in memory and handed to the sink with a single
//! `write_all`, so a record is never split across sink calls.

use std::io::Write;

use tracing::debug;

use crate::error::PcapGenError;
use crate::frame::LinkFrame;

/// Microsecond-resolution pcap magic number
pub const PCAP_MAGIC: u32 = 0xA1B2_C3D4;

pub const PCAP_VERSION_MAJOR: u16 = 2;
pub const PCAP_VERSION_MINOR: u16 = 4;

/// Largest frame a reader must accept
pub const PCAP_SNAPLEN: u32 = 65535;

/// LINKTYPE_ETHERNET
pub const LINKTYPE_ETHERNET: u32 = 1;

pub const GLOBAL_HEADER_LEN: usize = 24;
pub const RECORD_HEADER_LEN: usize = 16;

/// Capture time of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CaptureTimestamp {
    // ---
    pub secs: u32,
    pub micros: u32,
}

impl CaptureTimestamp {
    // ---
    /// Timestamp of frame `index` in a stream starting at `start_secs`,
    /// with frames spaced `frame_micros` apart.
    ///
    /// Derived from the frame index rather than the RTP timestamp so it
    /// keeps increasing after the 32-bit RTP clock wraps. Saturates at
    /// `u32::MAX` seconds.
    pub fn for_frame(start_secs: u32, index: u64, frame_micros: u64) -> Self {
        // ---
        let offset = index.saturating_mul(frame_micros);
        let secs = u64::from(start_secs).saturating_add(offset / 1_000_000);

        match u32::try_from(secs) {
            Ok(secs) => Self {
                secs,
                micros: (offset % 1_000_000) as u32,
            },
            Err(_) => Self {
                secs: u32::MAX,
                micros: 999_999,
            },
        }
    }
}

/// Appends link-layer frames to a pcap stream.
///
/// The global header is written once, by [`CaptureWriter::new`].
pub struct CaptureWriter<W: Write> {
    // ---
    sink: W,
    frames_written: u64,
    bytes_written: u64,
    last_timestamp: CaptureTimestamp,
}

impl<W: Write> CaptureWriter<W> {
    // ---
    /// Writes the global header to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `IoWrite` if the sink rejects the header.
    pub fn new(mut sink: W) -> Result<Self, PcapGenError> {
        // ---
        let header = global_header();
        sink.write_all(&header).map_err(PcapGenError::IoWrite)?;

        Ok(Self {
            sink,
            frames_written: 0,
            bytes_written: GLOBAL_HEADER_LEN as u64,
            last_timestamp: CaptureTimestamp::default(),
        })
    }

    /// Appends one record.
    ///
    /// A timestamp earlier than the previous record's is raised to it, so
    /// record times never go backwards.
    ///
    /// # Errors
    ///
    /// Returns `IoWrite` if the sink rejects the record.
    pub fn write_frame(&mut self, frame: &LinkFrame, timestamp: CaptureTimestamp) -> Result<(), PcapGenError> {
        // ---
        let timestamp = timestamp.max(self.last_timestamp);
        let len = frame.len() as u32;

        let mut record = Vec::with_capacity(RECORD_HEADER_LEN + frame.len());
        record.extend_from_slice(&timestamp.secs.to_le_bytes());
        record.extend_from_slice(&timestamp.micros.to_le_bytes());
        record.extend_from_slice(&len.to_le_bytes()); // incl_len
        record.extend_from_slice(&len.to_le_bytes()); // orig_len, never truncated
        record.extend_from_slice(frame.as_bytes());

        self.sink.write_all(&record).map_err(PcapGenError::IoWrite)?;

        self.frames_written += 1;
        self.bytes_written += record.len() as u64;
        self.last_timestamp = timestamp;

        if self.frames_written % 100 == 0 {
            debug!(
                "Wrote {} frames ({} bytes)",
                self.frames_written, self.bytes_written
            );
        }

        Ok(())
    }

    /// Flushes the sink.
    pub fn flush(&mut self) -> Result<(), PcapGenError> {
        // ---
        self.sink.flush().map_err(PcapGenError::IoWrite)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes handed to the sink, global header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn global_header() -> [u8; GLOBAL_HEADER_LEN] {
    // ---
    let mut h = [0u8; GLOBAL_HEADER_LEN];
    h[0..4].copy_from_slice(&PCAP_MAGIC.to_le_bytes());
    h[4..6].copy_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
    h[6..8].copy_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
    // h[8..12]: thiszone = 0 (UTC)
    // h[12..16]: sigfigs = 0
    h[16..20].copy_from_slice(&PCAP_SNAPLEN.to_le_bytes());
    h[20..24].copy_from_slice(&LINKTYPE_ETHERNET.to_le_bytes());
    h
}

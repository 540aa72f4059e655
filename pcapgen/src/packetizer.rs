//! RTP packetization of encoded samples.
//!
//! Encoded bytes are cut into consecutive, non-overlapping frames of
//! `frame_samples` codes. Packet `i` (0-indexed, in emission order) carries
//! `sequence = initial_sequence + i (mod 2^16)` and
//! `timestamp = i * frame_samples (mod 2^32)`.

use serde::{Deserialize, Serialize};

use crate::codec::MULAW_SILENCE;
use crate::config::PipelineConfig;
use rtp_pcap_common::RtpPacket;

/// Handling of a trailing chunk shorter than one frame.
///
/// The default drops it, which is what existing capture fixtures were
/// generated with. Padding is available for consumers that need every
/// input sample on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Emit no packet for the short chunk; its samples are lost.
    #[default]
    DropIncompleteFinalFrame,

    /// Fill the short chunk up with encoded silence and emit it.
    PadWithSilence,
}

/// Splits encoded audio into sequenced RTP packets.
#[derive(Debug, Clone)]
pub struct RtpPacketizer {
    // ---
    payload_type: u8,
    ssrc: u32,
    initial_sequence: u16,
    frame_samples: usize,
    tail_policy: TailPolicy,
}

impl RtpPacketizer {
    // ---
    /// Builds a packetizer from a validated config.
    ///
    /// # Panics
    ///
    /// Panics if `config.frame_samples` is zero. [`PipelineConfig::validate`]
    /// rejects such a config.
    pub fn new(config: &PipelineConfig) -> Self {
        // ---
        assert!(config.frame_samples > 0, "frame_samples must be non-zero");

        Self {
            payload_type: config.payload_type,
            ssrc: config.ssrc,
            initial_sequence: config.initial_sequence,
            frame_samples: config.frame_samples,
            tail_policy: config.tail_policy,
        }
    }

    /// Number of packets emitted for `encoded_len` codes.
    pub fn packet_count(&self, encoded_len: usize) -> usize {
        // ---
        match self.tail_policy {
            TailPolicy::DropIncompleteFinalFrame => encoded_len / self.frame_samples,
            TailPolicy::PadWithSilence => encoded_len.div_ceil(self.frame_samples),
        }
    }

    /// Number of trailing codes that appear in no packet.
    pub fn dropped_samples(&self, encoded_len: usize) -> usize {
        // ---
        match self.tail_policy {
            TailPolicy::DropIncompleteFinalFrame => encoded_len % self.frame_samples,
            TailPolicy::PadWithSilence => 0,
        }
    }

    /// Lazily yields packets in emission order.
    pub fn packets<'a>(&'a self, encoded: &'a [u8]) -> impl Iterator<Item = RtpPacket> + 'a {
        // ---
        encoded
            .chunks(self.frame_samples)
            .filter_map(move |chunk| self.frame_payload(chunk))
            .enumerate()
            .map(move |(index, payload)| self.packet_at(index, payload))
    }

    /// Collects every packet for `encoded`.
    pub fn packetize(&self, encoded: &[u8]) -> Vec<RtpPacket> {
        // ---
        self.packets(encoded).collect()
    }

    fn frame_payload(&self, chunk: &[u8]) -> Option<Vec<u8>> {
        // ---
        if chunk.len() == self.frame_samples {
            return Some(chunk.to_vec());
        }

        match self.tail_policy {
            TailPolicy::DropIncompleteFinalFrame => None,
            TailPolicy::PadWithSilence => {
                let mut payload = chunk.to_vec();
                payload.resize(self.frame_samples, MULAW_SILENCE);
                Some(payload)
            }
        }
    }

    fn packet_at(&self, index: usize, payload: Vec<u8>) -> RtpPacket {
        // ---
        // Truncating casts are the modular reductions the header fields need
        let sequence = self.initial_sequence.wrapping_add(index as u16);
        let timestamp = (index as u32).wrapping_mul(self.frame_samples as u32);

        RtpPacket::new(self.payload_type, sequence, timestamp, self.ssrc, payload)
    }
}

//! RTP packet structure and serialization.
//!
//! Implements the RFC 3550 fixed header. Padding, header extensions and
//! CSRC lists are never emitted: a synthesized stream has exactly one
//! source and no profile-specific extensions.

/// RTP packet version 2 (as per RFC 3550)
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed RTP header in bytes (no CSRC, no extension).
pub const RTP_HEADER_LEN: usize = 12;

/// Static payload type for G.711 mu-law (RFC 3551).
pub const PAYLOAD_TYPE_PCMU: u8 = 0;

/// RTP packet structure for audio transmission.
///
/// # Protocol Details
///
/// - Version: Always 2 (RFC 3550)
/// - Payload Type: 7-bit codec identifier (0 for PCMU)
/// - Marker: Carried for completeness, cleared for continuous speech
/// - Sequence: Increments by 1 for each packet (wraps at 65535)
/// - Timestamp: Increments by samples-per-frame (wraps at 2^32)
/// - SSRC: Synchronization source identifier, constant per stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    // ---
    /// 7-bit payload type
    pub payload_type: u8,

    /// Marker bit
    pub marker: bool,

    /// Packet sequence number (wraps at 65535)
    pub sequence: u16,

    /// RTP timestamp in sample units
    pub timestamp: u32,

    /// Synchronization source identifier
    pub ssrc: u32,

    /// Encoded audio payload
    pub payload: Vec<u8>,
}

impl RtpPacket {
    // ---
    /// Creates a new RTP packet with the marker bit cleared.
    ///
    /// # Arguments
    ///
    /// * `payload_type` - Codec payload type (only the low 7 bits are used)
    /// * `sequence` - Packet sequence number
    /// * `timestamp` - RTP timestamp (in sample units)
    /// * `ssrc` - Synchronization source identifier
    /// * `payload` - Encoded audio data
    pub fn new(payload_type: u8, sequence: u16, timestamp: u32, ssrc: u32, payload: Vec<u8>) -> Self {
        // ---
        Self {
            payload_type,
            marker: false,
            sequence,
            timestamp,
            ssrc,
            payload,
        }
    }

    /// Length of the serialized packet in bytes.
    pub fn wire_len(&self) -> usize {
        // ---
        RTP_HEADER_LEN + self.payload.len()
    }

    /// Serializes the RTP packet into wire format.
    ///
    /// # Wire Format
    ///
    /// ```text
    ///  0                   1                   2                   3
    ///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |                           timestamp                           |
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |           synchronization source (SSRC) identifier            |
    /// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
    /// |                           payload...                          |
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        // ---
        let mut buf = Vec::with_capacity(self.wire_len());

        // Byte 0: V(2) | P(1) | X(1) | CC(4)
        // V=2, P=0 (no padding), X=0 (no extension), CC=0 (no CSRC)
        buf.push(RTP_VERSION << 6);

        // Byte 1: M(1) | PT(7)
        let marker = if self.marker { 0x80 } else { 0x00 };
        buf.push(marker | (self.payload_type & 0x7F));

        // Bytes 2-3: Sequence number (big-endian)
        buf.extend_from_slice(&self.sequence.to_be_bytes());

        // Bytes 4-7: Timestamp (big-endian)
        buf.extend_from_slice(&self.timestamp.to_be_bytes());

        // Bytes 8-11: SSRC (big-endian)
        buf.extend_from_slice(&self.ssrc.to_be_bytes());

        buf.extend_from_slice(&self.payload);

        buf
    }
}

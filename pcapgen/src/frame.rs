//! Ethernet / IPv4 / UDP framing of RTP packets.
//!
//! ```text
//! +----------------+-------------+------------+------------------+
//! | Ethernet (14)  | IPv4 (20)   | UDP (8)    | RTP (12 + N)     |
//! +----------------+-------------+------------+------------------+
//! ```
//!
//! No VLAN tag and no IP options. All multi-byte fields are big-endian.

use std::net::Ipv4Addr;

use crate::config::{MacAddr, PipelineConfig};
use rtp_pcap_common::RtpPacket;

/// Ethernet II header length
pub const ETHERNET_HEADER_LEN: usize = 14;

/// IPv4 header length without options
pub const IPV4_HEADER_LEN: usize = 20;

/// UDP header length
pub const UDP_HEADER_LEN: usize = 8;

/// Offset of the UDP payload (the RTP packet) within a frame.
pub const UDP_PAYLOAD_OFFSET: usize = ETHERNET_HEADER_LEN + IPV4_HEADER_LEN + UDP_HEADER_LEN;

const ETHERTYPE_IPV4: u16 = 0x0800;
const IPPROTO_UDP: u8 = 17;

/// Version 4, IHL 5 words
const IPV4_VERSION_IHL: u8 = 0x45;

const IPV4_IDENTIFICATION: u16 = 1;

/// One complete link-layer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    // ---
    bytes: Vec<u8>,
}

impl LinkFrame {
    // ---
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The UDP payload, i.e. the serialized RTP packet.
    pub fn udp_payload(&self) -> &[u8] {
        &self.bytes[UDP_PAYLOAD_OFFSET..]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Wraps RTP packets in fixed Ethernet, IPv4 and UDP headers.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    // ---
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    ttl: u8,
}

impl FrameBuilder {
    // ---
    pub fn new(config: &PipelineConfig) -> Self {
        // ---
        Self {
            src_mac: config.src_mac,
            dst_mac: config.dst_mac,
            src_ip: config.src_ip,
            dst_ip: config.dst_ip,
            src_port: config.src_port,
            dst_port: config.dst_port,
            ttl: config.ip_ttl,
        }
    }

    /// Builds the frame carrying `packet`.
    pub fn build(&self, packet: &RtpPacket) -> LinkFrame {
        // ---
        let rtp = packet.serialize();
        let udp_len = UDP_HEADER_LEN + rtp.len();
        let ip_len = IPV4_HEADER_LEN + udp_len;

        let mut bytes = Vec::with_capacity(ETHERNET_HEADER_LEN + ip_len);

        // Ethernet II
        bytes.extend_from_slice(&self.dst_mac.octets());
        bytes.extend_from_slice(&self.src_mac.octets());
        bytes.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

        bytes.extend_from_slice(&self.ipv4_header(ip_len as u16));
        bytes.extend_from_slice(&self.udp_header(&rtp));
        bytes.extend_from_slice(&rtp);

        LinkFrame { bytes }
    }

    fn ipv4_header(&self, total_len: u16) -> [u8; IPV4_HEADER_LEN] {
        // ---
        let mut h = [0u8; IPV4_HEADER_LEN];
        h[0] = IPV4_VERSION_IHL;
        h[1] = 0; // DSCP/ECN
        h[2..4].copy_from_slice(&total_len.to_be_bytes());
        h[4..6].copy_from_slice(&IPV4_IDENTIFICATION.to_be_bytes());
        // h[6..8]: flags + fragment offset, zero
        h[8] = self.ttl;
        h[9] = IPPROTO_UDP;
        // h[10..12]: checksum, computed over the header with this field zeroed
        h[12..16].copy_from_slice(&self.src_ip.octets());
        h[16..20].copy_from_slice(&self.dst_ip.octets());

        let checksum = ipv4_checksum(&h);
        h[10..12].copy_from_slice(&checksum.to_be_bytes());
        h
    }

    fn udp_header(&self, payload: &[u8]) -> [u8; UDP_HEADER_LEN] {
        // ---
        let udp_len = (UDP_HEADER_LEN + payload.len()) as u16;

        let mut h = [0u8; UDP_HEADER_LEN];
        h[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        h[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        h[4..6].copy_from_slice(&udp_len.to_be_bytes());

        let checksum = self.udp_checksum(&h, payload);
        h[6..8].copy_from_slice(&checksum.to_be_bytes());
        h
    }

    /// UDP checksum over the IPv4 pseudo-header, UDP header and payload.
    fn udp_checksum(&self, header: &[u8; UDP_HEADER_LEN], payload: &[u8]) -> u16 {
        // ---
        let udp_len = (UDP_HEADER_LEN + payload.len()) as u16;

        let mut pseudo = [0u8; 12];
        pseudo[0..4].copy_from_slice(&self.src_ip.octets());
        pseudo[4..8].copy_from_slice(&self.dst_ip.octets());
        pseudo[9] = IPPROTO_UDP;
        pseudo[10..12].copy_from_slice(&udp_len.to_be_bytes());

        let sum = ones_complement_sum(0, &pseudo);
        let sum = ones_complement_sum(sum, header);
        let sum = ones_complement_sum(sum, payload);

        // Zero means "no checksum" for UDP over IPv4
        match !fold(sum) {
            0 => 0xFFFF,
            c => c,
        }
    }
}

/// Standard IPv4 header checksum (RFC 791 / RFC 1071).
///
/// Computed with the checksum field zeroed; summing a header that already
/// carries its checksum yields 0 when the header is intact.
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    // ---
    !fold(ones_complement_sum(0, header))
}

/// Adds big-endian 16-bit words to `acc`, padding an odd tail with zero.
fn ones_complement_sum(acc: u32, data: &[u8]) -> u32 {
    // ---
    let mut chunks = data.chunks_exact(2);
    let mut sum = acc;
    for word in &mut chunks {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum
}

fn fold(mut sum: u32) -> u16 {
    // ---
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

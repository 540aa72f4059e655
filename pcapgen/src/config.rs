//! Pipeline configuration.
//!
//! A single immutable [`PipelineConfig`] carries every header constant and
//! codec parameter. Defaults reproduce the reference capture layout: a PCMU
//! stream from `127.0.0.1:4000` to `127.0.0.1:4002` (the SIP scenario's
//! `m=audio` port) with SSRC `0x12345678`.
//!
//! Configuration can also be read from TOML. Every key is optional:
//!
//! ```toml
//! src_mac = "00:11:22:33:44:55"
//! dst_port = 6000
//! ssrc = 305419896
//! tail_policy = "pad_with_silence"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;

use crate::codec::{SAMPLES_PER_FRAME, SAMPLE_RATE};
use crate::error::InputError;
use crate::packetizer::TailPolicy;
use rtp_pcap_common::rtp::PAYLOAD_TYPE_PCMU;

/// 48-bit Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    // ---
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        let invalid = || InputError::InvalidMacAddress(s.to_string());

        let mut octets = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Immutable configuration for one capture run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    // ---
    /// Ethernet source address
    pub src_mac: MacAddr,

    /// Ethernet destination address
    pub dst_mac: MacAddr,

    /// IPv4 source address
    pub src_ip: Ipv4Addr,

    /// IPv4 destination address
    pub dst_ip: Ipv4Addr,

    /// UDP source port
    pub src_port: u16,

    /// UDP destination port
    pub dst_port: u16,

    /// RTP synchronization source, constant for the whole file
    pub ssrc: u32,

    /// Sequence number of the first packet
    pub initial_sequence: u16,

    /// RTP payload type (0 = PCMU)
    pub payload_type: u8,

    /// Samples per RTP frame; only 160 (20 ms at 8 kHz) is accepted
    pub frame_samples: usize,

    /// IPv4 time-to-live
    pub ip_ttl: u8,

    /// What to do with a trailing chunk shorter than a frame
    pub tail_policy: TailPolicy,

    /// Capture timestamp of the first record, in Unix seconds
    pub start_time: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            src_mac: MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            dst_mac: MacAddr::new([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]),
            src_ip: Ipv4Addr::LOCALHOST,
            dst_ip: Ipv4Addr::LOCALHOST,
            src_port: 4000,
            dst_port: 4002,
            ssrc: 0x1234_5678,
            initial_sequence: 0,
            payload_type: PAYLOAD_TYPE_PCMU,
            frame_samples: SAMPLES_PER_FRAME,
            ip_ttl: 64,
            tail_policy: TailPolicy::default(),
            start_time: 0,
        }
    }
}

impl PipelineConfig {
    // ---
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        // ---
        let config: Self = toml::from_str(s).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        // ---
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&text).with_context(|| format!("in config file {}", path.display()))
    }

    /// Checks the values the wire formats cannot represent.
    pub fn validate(&self) -> Result<(), InputError> {
        // ---
        if self.payload_type > 0x7F {
            return Err(InputError::InvalidConfig(format!(
                "payload type {} does not fit in 7 bits",
                self.payload_type
            )));
        }

        if self.frame_samples != SAMPLES_PER_FRAME {
            return Err(InputError::InvalidConfig(format!(
                "frame size is fixed at {} samples (20 ms at {} Hz), got {}",
                SAMPLES_PER_FRAME, SAMPLE_RATE, self.frame_samples
            )));
        }

        if self.ip_ttl == 0 {
            return Err(InputError::InvalidConfig("IPv4 TTL must be non-zero".into()));
        }

        Ok(())
    }

    /// Duration of one frame in microseconds.
    pub fn frame_duration_micros(&self) -> u64 {
        // ---
        self.frame_samples as u64 * 1_000_000 / SAMPLE_RATE as u64
    }
}

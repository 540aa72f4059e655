//! Shared building blocks for the capture generator.
//!
//! This crate provides the RTP packet structure and wire serialization,
//! plus the CLI color policy and observability setup used by the binary.

pub mod cli;
pub mod observability;
pub mod rtp;

pub use cli::ColorWhen;
pub use observability::{init_tracing, MetricsContext};
pub use rtp::RtpPacket;

//! PCMU/RTP capture generator - CLI binary.
//!
//! Reads an 8 kHz WAV file, compands it to mu-law, packetizes it into RTP,
//! wraps each packet in Ethernet/IPv4/UDP and writes a libpcap file.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::info;

use pcapgen::{MacAddr, MetricsContext, PipelineConfig, TailPolicy};
use rtp_pcap_common::{init_tracing, ColorWhen};

/// RTP capture generator - Build a replayable voice pcap from a WAV file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    // ---
    /// Input audio file (WAV, 8000 Hz)
    #[arg(short, long)]
    input: PathBuf,

    /// Output capture file (libpcap format)
    #[arg(short, long, default_value = "voice.pcap")]
    output: PathBuf,

    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ethernet source address
    #[arg(long)]
    src_mac: Option<MacAddr>,

    /// Ethernet destination address
    #[arg(long)]
    dst_mac: Option<MacAddr>,

    /// IPv4 source address
    #[arg(long)]
    src_ip: Option<Ipv4Addr>,

    /// IPv4 destination address
    #[arg(long)]
    dst_ip: Option<Ipv4Addr>,

    /// UDP source port
    #[arg(long)]
    src_port: Option<u16>,

    /// UDP destination port (the scenario's m=audio port)
    #[arg(long)]
    dst_port: Option<u16>,

    /// RTP SSRC, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_u32, conflicts_with = "random_ssrc")]
    ssrc: Option<u32>,

    /// Pick a random SSRC for this capture
    #[arg(long)]
    random_ssrc: bool,

    /// Sequence number of the first packet
    #[arg(long)]
    initial_sequence: Option<u16>,

    /// Pad a short final frame with silence instead of dropping it
    #[arg(long)]
    pad_tail: bool,

    /// Capture timestamp of the first packet (Unix seconds)
    #[arg(long)]
    start_time: Option<u32>,

    /// Write Prometheus metrics (text format) to this file after the run
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Coloring (auto, always, never)
    #[arg(long, default_value = "auto")]
    color: ColorWhen,
}

impl Args {
    // ---
    /// Loads the config file, if any, and applies flag overrides.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        // ---
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(mac) = self.src_mac {
            config.src_mac = mac;
        }
        if let Some(mac) = self.dst_mac {
            config.dst_mac = mac;
        }
        if let Some(ip) = self.src_ip {
            config.src_ip = ip;
        }
        if let Some(ip) = self.dst_ip {
            config.dst_ip = ip;
        }
        if let Some(port) = self.src_port {
            config.src_port = port;
        }
        if let Some(port) = self.dst_port {
            config.dst_port = port;
        }
        if let Some(ssrc) = self.ssrc {
            config.ssrc = ssrc;
        }
        if self.random_ssrc {
            config.ssrc = rand::random::<u32>();
        }
        if let Some(seq) = self.initial_sequence {
            config.initial_sequence = seq;
        }
        if self.pad_tail {
            config.tail_policy = TailPolicy::PadWithSilence;
        }
        if let Some(start) = self.start_time {
            config.start_time = start;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_u32(s: &str) -> Result<u32, String> {
    // ---
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid value '{s}': {e}"))
}

/// Capture version number from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    let args = Args::parse();

    init_tracing(args.color)?;

    let config = args.pipeline_config()?;

    info!("Starting RTP capture generator v{VERSION}");
    info!("Input file: {}", args.input.display());
    info!("Output file: {}", args.output.display());
    info!(
        "Stream: {}:{} -> {}:{}",
        config.src_ip, config.src_port, config.dst_ip, config.dst_port
    );
    info!("Session SSRC: 0x{:08X}", config.ssrc);

    let metrics = MetricsContext::new("pcapgen")?;

    // Decode and write in a blocking task; the pipeline does file I/O only
    let input = args.input.clone();
    let output = args.output.clone();
    let task_metrics = metrics.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<_> {
        let waveform = pcapgen::read_wav(&input)?;
        info!(
            "Loaded {:.2}s of audio ({} frames)",
            waveform.duration_secs(),
            waveform.frame_count()
        );

        pcapgen::write_capture_file(&output, &waveform, &config, &task_metrics)
            .with_context(|| format!("failed to generate {}", output.display()))
    })
    .await
    .context("capture generation task failed")??;

    if let Some(path) = &args.metrics_out {
        metrics.write_textfile(path)?;
        info!("Metrics written to {}", path.display());
    }

    println!(
        "Generated: {} packets: {}",
        args.output.display(),
        summary.frames_written
    );

    Ok(())
}

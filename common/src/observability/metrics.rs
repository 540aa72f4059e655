//! Prometheus metrics (Rust `prometheus` crate).
//!
//! One `MetricsContext` is intended per process. A capture run is a batch
//! job, so instead of a scrape endpoint the registry can be dumped to a file
//! in the text exposition format (node-exporter textfile collector style).

use anyhow::{Context, Result};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};
use std::fs;
use std::path::Path;

/// Prometheus metrics registry + handles.
///
/// Thin wrapper so pipeline instrumentation is just counter increments and
/// histogram observations.
#[derive(Clone)]
pub struct MetricsContext {
    // ---
    registry: Registry,

    // Output counters
    pub packets_written_total: IntCounter,
    pub bytes_written_total: IntCounter,

    // Input counters
    pub samples_encoded_total: IntCounter,
    pub samples_dropped_total: IntCounter,

    // Stage durations (seconds)
    pub encode_seconds: Histogram,
    pub capture_write_seconds: Histogram,
}

impl MetricsContext {
    // ---
    /// Create a new registry and register the standard metrics.
    ///
    /// `process_name` is applied as a constant label (`process=<name>`).
    pub fn new(process_name: &str) -> Result<Self> {
        // ---
        let registry = Registry::new_custom(
            Some("rtp_pcap".into()),
            Some(prometheus::labels! { "process".to_string() => process_name.to_string() }),
        )?;

        let packets_written_total = IntCounter::with_opts(Opts::new(
            "rtp_packets_written_total",
            "Total RTP packets written to capture files",
        ))?;
        let bytes_written_total = IntCounter::with_opts(Opts::new(
            "rtp_bytes_written_total",
            "Total bytes written to capture files, headers included",
        ))?;
        let samples_encoded_total = IntCounter::with_opts(Opts::new(
            "samples_encoded_total",
            "Total PCM samples companded to mu-law",
        ))?;
        let samples_dropped_total = IntCounter::with_opts(Opts::new(
            "samples_dropped_total",
            "Trailing samples discarded because they did not fill a frame",
        ))?;

        let encode_seconds = Histogram::with_opts(HistogramOpts::new(
            "encode_seconds",
            "Waveform encode duration in seconds",
        ))?;
        let capture_write_seconds = Histogram::with_opts(HistogramOpts::new(
            "capture_write_seconds",
            "Duration of framing and writing all capture records in seconds",
        ))?;

        registry.register(Box::new(packets_written_total.clone()))?;
        registry.register(Box::new(bytes_written_total.clone()))?;
        registry.register(Box::new(samples_encoded_total.clone()))?;
        registry.register(Box::new(samples_dropped_total.clone()))?;
        registry.register(Box::new(encode_seconds.clone()))?;
        registry.register(Box::new(capture_write_seconds.clone()))?;

        Ok(Self {
            registry,
            packets_written_total,
            bytes_written_total,
            samples_encoded_total,
            samples_dropped_total,
            encode_seconds,
            capture_write_seconds,
        })
    }

    /// Gather metric families from this registry.
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        // ---
        self.registry.gather()
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        // ---
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("failed to encode metrics")?;

        String::from_utf8(buffer).context("metrics output is not valid UTF-8")
    }

    /// Writes the rendered metrics to `path`, replacing any existing file.
    pub fn write_textfile<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // ---
        let path = path.as_ref();
        let rendered = self.render()?;
        fs::write(path, rendered)
            .with_context(|| format!("failed to write metrics to {}", path.display()))
    }
}

//! Tracing initialization.
//!
//! Logs go to stderr so stdout stays free for the run summary.

use crate::ColorWhen;
use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing subscriber.
///
/// - Respects `RUST_LOG` via `EnvFilter` (defaults to `info`).
/// - ANSI color controlled by `ColorWhen`.
/// - Fails if a global subscriber was already installed.
pub fn init_tracing(color: ColorWhen) -> Result<()> {
    // ---
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(color.should_color_stderr())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

//! G.711 mu-law (PCMU) style companding.
//!
//! The law used here is a simplified logarithmic form:
//!
//! ```text
//! s    = clip(x * 32768, -32768, 32767)
//! mag  = min(floor(128 * ln(1 + |s|) / ln(1 + 32635)), 127)
//! code = !(sign | mag)
//! ```
//!
//! It has no bias term and no segment table, so codes differ from a
//! canonical ITU-T G.711 encoder. Do not swap in the standard algorithm
//! without regenerating fixtures.
//!
//! Below |s| = 32635 the codes are identical to the legacy capture script.
//! At and above it (267 of the 65536 16-bit inputs) that script let the
//! magnitude reach 128 and spill into the sign bit, encoding both full-scale
//! polarities as 0x7F. Here the magnitude saturates at 127, so +1.0 encodes
//! as 0x80 and -1.0 as 0x00.

/// Codec sample rate (narrowband telephony)
pub const SAMPLE_RATE: u32 = 8000;

/// Frame duration in milliseconds
pub const FRAME_DURATION_MS: usize = 20;

/// Samples per frame (20ms at 8kHz)
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE as usize * FRAME_DURATION_MS) / 1000;

/// Code emitted for a zero sample.
pub const MULAW_SILENCE: u8 = 0xFF;

/// Magnitude at which the logarithmic curve reaches full scale.
const MULAW_CLIP: f64 = 32635.0;

const MAGNITUDE_MAX: u8 = 0x7F;
const SIGN_BIT: u8 = 0x80;

/// Compands one normalized sample into an 8-bit code.
///
/// Values beyond +/-1.0 clip to the same code as +/-1.0. `NaN` encodes
/// like silence.
pub fn encode_sample(sample: f32) -> u8 {
    // ---
    let s = (f64::from(sample) * 32768.0).clamp(-32768.0, 32767.0);

    let sign = if s < 0.0 { SIGN_BIT } else { 0x00 };

    // `as` saturates and maps NaN to 0
    let mag = (128.0 * s.abs().ln_1p() / MULAW_CLIP.ln_1p()) as u8;
    let mag = mag.min(MAGNITUDE_MAX);

    !(sign | mag)
}

/// Compands a whole waveform, one code per sample.
pub fn encode(samples: &[f32]) -> Vec<u8> {
    // ---
    samples.iter().copied().map(encode_sample).collect()
}

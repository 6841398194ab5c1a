//! Offline siren rendering to WAV

use std::path::Path;

use anyhow::{Context, Result};
use klaxon_core::{SirenWaveform, WaveformParams};

/// Write `seconds` of the siren as 16-bit mono PCM.
///
/// Returns the number of samples written.
pub fn render_wav(path: &Path, params: WaveformParams, seconds: f64) -> Result<u64> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: params.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let total = (seconds.max(0.0) * f64::from(params.sample_rate)).round() as u64;
    for sample in SirenWaveform::new(params).take(total as usize) {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;

    Ok(total)
}

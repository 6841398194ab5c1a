//! Alternating-tone square wave synthesis
//!
//! Produces 16-bit mono PCM that switches between a low and a high tone every
//! segment. The generator is deterministic: the same parameters always yield
//! the same samples, no matter how the caller slices them into blocks.

use std::f64::consts::TAU;

use crate::config::ConfigError;

/// Largest positive 16-bit sample value
const FULL_SCALE: f64 = 32767.0;

/// Parameters of the siren waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformParams {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Low tone in Hz (played first)
    pub low_hz: f64,
    /// High tone in Hz
    pub high_hz: f64,
    /// Length of one tone segment in milliseconds
    pub segment_ms: u32,
    /// Peak gain in (0, 1]
    pub amplitude: f64,
}

impl Default for WaveformParams {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            low_hz: 600.0,
            high_hz: 1400.0,
            segment_ms: 350,
            amplitude: 0.9,
        }
    }
}

impl WaveformParams {
    /// Samples held at one tone before alternating
    pub fn samples_per_segment(&self) -> u32 {
        (u64::from(self.sample_rate) * u64::from(self.segment_ms) / 1000) as u32
    }

    /// Magnitude of every emitted sample
    pub fn peak(&self) -> i16 {
        (self.amplitude * FULL_SCALE).floor() as i16
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: String) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if self.sample_rate == 0 {
            return invalid("siren.sample_rate", "must be greater than zero".into());
        }
        let nyquist = f64::from(self.sample_rate) / 2.0;
        for (field, hz) in [("siren.low_hz", self.low_hz), ("siren.high_hz", self.high_hz)] {
            if !(hz > 0.0 && hz < nyquist) {
                return invalid(field, format!("{hz} Hz is outside (0, {nyquist})"));
            }
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return invalid("siren.amplitude", format!("{} is outside (0, 1]", self.amplitude));
        }
        if self.samples_per_segment() == 0 {
            return invalid(
                "siren.segment_ms",
                format!("{} ms is shorter than one sample", self.segment_ms),
            );
        }
        Ok(())
    }
}

/// Which of the two siren tones is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Low,
    High,
}

impl Tone {
    fn toggled(self) -> Self {
        match self {
            Tone::Low => Tone::High,
            Tone::High => Tone::Low,
        }
    }
}

/// Per-session oscillator state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformState {
    /// Oscillator phase in radians, kept in [0, 2π)
    pub phase: f64,
    pub tone: Tone,
    pub samples_since_switch: u32,
}

impl Default for WaveformState {
    fn default() -> Self {
        Self {
            phase: 0.0,
            tone: Tone::Low,
            samples_since_switch: 0,
        }
    }
}

/// Square wave generator alternating between two tones
///
/// Also usable as an infinite iterator of samples.
#[derive(Debug, Clone)]
pub struct SirenWaveform {
    params: WaveformParams,
    low_step: f64,
    high_step: f64,
    peak: i16,
    samples_per_segment: u32,
    state: WaveformState,
    segment_switches: u64,
}

impl SirenWaveform {
    /// Create a generator at phase 0 on the low tone.
    ///
    /// Parameters are expected to have passed [`WaveformParams::validate`].
    pub fn new(params: WaveformParams) -> Self {
        let rate = f64::from(params.sample_rate.max(1));
        Self {
            params,
            low_step: TAU * params.low_hz / rate,
            high_step: TAU * params.high_hz / rate,
            peak: params.peak(),
            samples_per_segment: params.samples_per_segment().max(1),
            state: WaveformState::default(),
            segment_switches: 0,
        }
    }

    pub fn params(&self) -> &WaveformParams {
        &self.params
    }

    pub fn state(&self) -> &WaveformState {
        &self.state
    }

    pub fn tone(&self) -> Tone {
        self.state.tone
    }

    /// Number of tone switches since creation or the last reset
    pub fn segment_switches(&self) -> u64 {
        self.segment_switches
    }

    /// Return to phase 0 on the low tone.
    pub fn reset(&mut self) {
        self.state = WaveformState::default();
        self.segment_switches = 0;
    }

    /// Produce the next sample and advance the oscillator.
    pub fn next_sample(&mut self) -> i16 {
        let step = match self.state.tone {
            Tone::Low => self.low_step,
            Tone::High => self.high_step,
        };
        self.state.phase += step;
        if self.state.phase >= TAU {
            self.state.phase -= TAU;
        }

        let sample = if self.state.phase.sin() >= 0.0 {
            self.peak
        } else {
            -self.peak
        };

        self.state.samples_since_switch += 1;
        if self.state.samples_since_switch >= self.samples_per_segment {
            self.state.tone = self.state.tone.toggled();
            self.state.samples_since_switch = 0;
            self.segment_switches += 1;
        }

        sample
    }

    /// Fill the whole block.
    pub fn fill(&mut self, block: &mut [i16]) {
        for slot in block.iter_mut() {
            *slot = self.next_sample();
        }
    }

    /// Fill the block while `keep_going` returns true, checked before every sample.
    ///
    /// Returns the number of samples written.
    pub fn fill_while(&mut self, block: &mut [i16], mut keep_going: impl FnMut() -> bool) -> usize {
        for (i, slot) in block.iter_mut().enumerate() {
            if !keep_going() {
                return i;
            }
            *slot = self.next_sample();
        }
        block.len()
    }
}

impl Iterator for SirenWaveform {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        Some(self.next_sample())
    }
}

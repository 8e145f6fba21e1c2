//! Engine configuration.
//!
//! All modules derive their wavetable phase increments, envelope ramp
//! lengths, and filter coefficients from the configuration they receive at
//! construction. The configuration is therefore fixed for the lifetime of a
//! [`Synth`](crate::graph::Synth): changing the sample rate or amplitude
//! range after tables have been built would silently invalidate them.

use serde::{Deserialize, Serialize};

use crate::graph::SynthError;

/// Immutable audio engine configuration.
///
/// The default profile matches the original 8-bit-flavored hardware target:
/// 8 kHz sample rate, 200-sample buffers, and a peak table amplitude of 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Number of 16-bit words produced per render cycle.
    pub buffer_size: usize,
    /// Peak waveform table amplitude. Oscillator and noise tables span
    /// `[-max_amplitude, max_amplitude]`; the mixer normalizes volume
    /// modulation against this value.
    pub max_amplitude: i32,
}

impl AudioConfig {
    /// Build a validated configuration.
    pub fn new(
        sample_rate: u32,
        buffer_size: usize,
        max_amplitude: i32,
    ) -> Result<Self, SynthError> {
        if sample_rate == 0 {
            return Err(SynthError::invalid_parameter(
                "config",
                "sample_rate must be greater than zero",
            ));
        }
        if buffer_size == 0 {
            return Err(SynthError::invalid_parameter(
                "config",
                "buffer_size must be greater than zero",
            ));
        }
        if !(1..=32767).contains(&max_amplitude) {
            return Err(SynthError::invalid_parameter(
                "config",
                "max_amplitude must be within 1..=32767",
            ));
        }
        Ok(Self {
            sample_rate,
            buffer_size,
            max_amplitude,
        })
    }

    /// Highest representable frequency, `sample_rate / 2`.
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Wall-clock duration of one render cycle in seconds. A render call
    /// must finish within this budget to keep the audio transport fed.
    pub fn buffer_period(&self) -> f64 {
        self.buffer_size as f64 / self.sample_rate as f64
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            buffer_size: 200,
            max_amplitude: 255,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.buffer_size, 200);
        assert_eq!(config.max_amplitude, 255);
        assert_eq!(config.nyquist(), 4000.0);
        assert!((config.buffer_period() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(AudioConfig::new(0, 64, 255).is_err());
    }

    #[test]
    fn rejects_zero_buffer_size() {
        assert!(AudioConfig::new(8000, 0, 255).is_err());
    }

    #[test]
    fn rejects_out_of_range_amplitude() {
        assert!(AudioConfig::new(8000, 64, 0).is_err());
        assert!(AudioConfig::new(8000, 64, 40000).is_err());
        assert!(AudioConfig::new(8000, 64, 32767).is_ok());
    }

    #[test]
    fn validated_constructor_matches_literal() {
        let config = AudioConfig::new(44100, 128, 10000).unwrap();
        assert_eq!(
            config,
            AudioConfig {
                sample_rate: 44100,
                buffer_size: 128,
                max_amplitude: 10000,
            }
        );
    }
}

//! Audio analysis configuration, band layout and simulated waveform.

use std::ops::Range;

use super::ConfigError;

/// Frequency analysis configuration (fixed resolution once started)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size (must be power of 2)
    /// 512 = 256 magnitude bins
    pub fft_size: usize,

    /// Exponential smoothing between consecutive frames (0 = none, <1)
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (decibels)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (decibels)
    pub max_db: f32,

    /// Sample rate assumed when no device reports one (Hz)
    pub fallback_sample_rate_hz: u32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
            fallback_sample_rate_hz: 48_000,
        }
    }
}

impl AnalyserConfig {
    /// Number of magnitude bins exposed per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Centre frequency of a bin (Hz) at the given sample rate
    pub fn bin_to_hz(&self, bin: usize, sample_rate_hz: u32) -> f32 {
        bin as f32 * sample_rate_hz as f32 / self.fft_size as f32
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if self.min_db >= self.max_db {
            return Err(ConfigError::DecibelRange {
                min: self.min_db,
                max: self.max_db,
            });
        }
        Ok(())
    }
}

/// Bin ranges treated as bass / mid / high (end exclusive)
#[derive(Debug, Clone)]
pub struct BandLayout {
    pub bass: Range<usize>,
    pub mid: Range<usize>,
    pub high: Range<usize>,
}

impl Default for BandLayout {
    fn default() -> Self {
        // ~0-940 Hz, 940-9400 Hz, 9.4-18.8 kHz at 48 kHz / 512
        Self {
            bass: 0..10,
            mid: 10..100,
            high: 100..200,
        }
    }
}

impl BandLayout {
    pub fn validate(&self, bin_count: usize) -> Result<(), ConfigError> {
        for (name, range) in [("bass", &self.bass), ("mid", &self.mid), ("high", &self.high)] {
            if range.start >= range.end || range.end > bin_count {
                return Err(ConfigError::BandRange {
                    band: name,
                    start: range.start,
                    end: range.end,
                    bins: bin_count,
                });
            }
        }
        Ok(())
    }
}

/// One sinusoidal layer of the simulated spectrum
#[derive(Debug, Clone, Copy)]
pub struct WaveLayer {
    /// Resting byte level of the band
    pub offset: f32,

    /// Peak deviation around `offset` (bytes)
    pub amplitude: f32,

    /// Temporal rate (radians per simulated second)
    pub rate: f32,

    /// Phase advance per bin (radians), gives the bar-like ripple
    pub bin_phase: f32,
}

/// Synthetic spectrum generator parameters (fallback when no device)
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Simulated time advanced on every read (seconds)
    pub time_step: f32,

    /// Slow, large low-band wave
    pub bass: WaveLayer,

    /// Medium mid-band wave
    pub mid: WaveLayer,

    /// Fast, small high-band wave
    pub high: WaveLayer,

    /// Peak noise contribution (bytes)
    pub noise_amplitude: f32,

    /// Spatial scale of the noise across bins
    pub noise_scale: f64,

    /// Periodic kick height (bytes, strongest at bin 0)
    pub pulse_amplitude: f32,

    /// Kick period (simulated seconds)
    pub pulse_period: f32,

    /// Noise seed
    pub noise_seed: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            time_step: 0.05,
            bass: WaveLayer {
                offset: 150.0,
                amplitude: 70.0,
                rate: 1.3,
                bin_phase: 0.25,
            },
            mid: WaveLayer {
                offset: 95.0,
                amplitude: 45.0,
                rate: 3.1,
                bin_phase: 0.12,
            },
            high: WaveLayer {
                offset: 45.0,
                amplitude: 20.0,
                rate: 7.7,
                bin_phase: 0.05,
            },
            noise_amplitude: 12.0,
            noise_scale: 0.37,
            pulse_amplitude: 60.0,
            pulse_period: 0.5,
            noise_seed: 7,
        }
    }
}

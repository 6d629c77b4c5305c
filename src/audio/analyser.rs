//! Byte frequency analysis of the latest captured window.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::capture::SampleSource;
use crate::params::{AnalyserConfig, ConfigError};

/// Fixed-resolution spectrum analyser.
///
/// Every buffer is allocated in [`Analyser::new`]; [`Analyser::analyse`]
/// only reuses them.
pub struct Analyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl Analyser {
    pub fn new(config: AnalyserConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            fft,
            window,
            samples: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; config.bin_count()],
            bytes: vec![0; config.bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Current byte magnitudes (one per bin)
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pull the latest window from `source` and refresh the magnitudes
    pub fn analyse(&mut self, source: &dyn SampleSource) -> &[u8] {
        source.read_latest(&mut self.samples);
        self.process()
    }

    /// Refresh the magnitudes from an explicit window of samples
    pub fn analyse_samples(&mut self, samples: &[f32]) -> &[u8] {
        let n = samples.len().min(self.samples.len());
        self.samples[..n].copy_from_slice(&samples[..n]);
        self.samples[n..].fill(0.0);
        self.process()
    }

    fn process(&mut self) -> &[u8] {
        for ((out, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(&self.samples)
            .zip(&self.window)
        {
            *out = Complex::new(sample * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let scale = 1.0 / self.config.fft_size as f32;
        let tau = self.config.smoothing;
        let db_span = self.config.max_db - self.config.min_db;

        for ((smoothed, byte), bin) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .zip(&self.spectrum)
        {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            *byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                (255.0 * (db - self.config.min_db) / db_span).clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }

        &self.bytes
    }
}

/// Blackman window (periodic form)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = 2.0 * PI * index as f32 / size as f32;
    0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
}

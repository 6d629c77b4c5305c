//! One-shot device request with a soft fallback to simulated data.

use super::analyser::Analyser;
use super::capture::{CaptureError, CpalCapture, SampleSource};
use super::simulated::SimulatedSpectrum;
use super::{AudioBands, AudioFrame};
use crate::params::{AnalyserConfig, BandLayout, ConfigError, SimulationParams};

/// Where the magnitude array comes from, chosen once per start
pub enum AudioSource {
    /// Live device plus the analyser fed from it
    Live {
        capture: Box<dyn SampleSource>,
        analyser: Analyser,
    },
    /// Synthetic generator
    Simulated(SimulatedSpectrum),
}

/// Audio sampler exposing a per-frame byte spectrum
pub struct AudioSampler {
    config: AnalyserConfig,
    layout: BandLayout,
    simulation: SimulationParams,
    source: Option<AudioSource>,
    status: String,
}

impl AudioSampler {
    pub fn new(
        config: AnalyserConfig,
        layout: BandLayout,
        simulation: SimulationParams,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        layout.validate(config.bin_count())?;

        Ok(Self {
            config,
            layout,
            simulation,
            source: None,
            status: "Audio idle: press Space to start".to_string(),
        })
    }

    /// True once a start attempt has resolved (live or simulated)
    pub fn is_ready(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.source, Some(AudioSource::Simulated(_)))
    }

    /// Human-readable state for the status indicator
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Make one device request through `open`.
    ///
    /// Already live: nothing happens. Failure: the sampler switches to
    /// simulated data and records why; it never returns an error.
    pub fn start<F>(&mut self, open: F) -> &str
    where
        F: FnOnce(&AnalyserConfig) -> Result<Box<dyn SampleSource>, CaptureError>,
    {
        if matches!(self.source, Some(AudioSource::Live { .. })) {
            return &self.status;
        }

        match open(&self.config) {
            Ok(capture) => match Analyser::new(self.config.clone()) {
                Ok(analyser) => {
                    self.status = format!(
                        "Listening: {} ({} bins @ {}Hz)",
                        capture.name(),
                        self.config.bin_count(),
                        capture.sample_rate()
                    );
                    log::info!("{}", self.status);
                    log::debug!("{}", self.describe_bands(capture.sample_rate()));
                    self.source = Some(AudioSource::Live { capture, analyser });
                }
                Err(e) => self.fall_back(&e.to_string()),
            },
            Err(e) => self.fall_back(&e.to_string()),
        }

        &self.status
    }

    /// Request the default cpal input device
    pub fn start_default(&mut self, device_query: Option<&str>, record_path: Option<&str>) -> &str {
        self.start(|config| {
            let capacity = config.fft_size * 8;
            CpalCapture::open(capacity, device_query, record_path)
                .map(|capture| Box::new(capture) as Box<dyn SampleSource>)
        })
    }

    /// Skip the device and go straight to simulated data
    pub fn start_simulated(&mut self) -> &str {
        if self.source.is_none() {
            self.source = Some(AudioSource::Simulated(self.simulator()));
            self.status = "Simulated audio".to_string();
            log::info!("{}", self.status);
        }
        &self.status
    }

    fn fall_back(&mut self, reason: &str) {
        log::warn!("Microphone unavailable ({}), using simulated audio", reason);
        self.status = format!("Simulated audio (microphone unavailable: {})", reason);
        if !self.is_simulated() {
            self.source = Some(AudioSource::Simulated(self.simulator()));
        }
    }

    /// Band edges in Hz at `sample_rate_hz`
    pub fn describe_bands(&self, sample_rate_hz: u32) -> String {
        let hz = |bin| self.config.bin_to_hz(bin, sample_rate_hz).round();
        let l = &self.layout;
        format!(
            "bass {}-{} Hz, mid {}-{} Hz, high {}-{} Hz",
            hz(l.bass.start),
            hz(l.bass.end),
            hz(l.mid.start),
            hz(l.mid.end),
            hz(l.high.start),
            hz(l.high.end)
        )
    }

    fn simulator(&self) -> SimulatedSpectrum {
        log::debug!(
            "Simulating {}",
            self.describe_bands(self.config.fallback_sample_rate_hz)
        );
        SimulatedSpectrum::new(
            self.simulation.clone(),
            self.layout.clone(),
            self.config.bin_count(),
        )
    }

    /// Refresh and return the current magnitude array.
    ///
    /// Before any start this is an empty frame whose averages are 0.
    pub fn audio_data(&mut self) -> AudioFrame<'_> {
        match &mut self.source {
            None => AudioFrame::empty(),
            Some(AudioSource::Live { capture, analyser }) => {
                AudioFrame::new(analyser.analyse(&**capture))
            }
            Some(AudioSource::Simulated(sim)) => AudioFrame::new(sim.next_frame()),
        }
    }

    /// Refresh and reduce to normalized band energies
    pub fn bands(&mut self) -> AudioBands {
        let layout = self.layout.clone();
        self.audio_data().bands(&layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    struct ToneSource {
        bin: usize,
    }

    impl SampleSource for ToneSource {
        fn read_latest(&self, out: &mut [f32]) {
            let n = out.len() as f32;
            for (i, s) in out.iter_mut().enumerate() {
                *s = 0.5 * (2.0 * PI * self.bin as f32 * i as f32 / n).sin();
            }
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn name(&self) -> &str {
            "tone"
        }
    }

    fn sampler() -> AudioSampler {
        AudioSampler::new(
            AnalyserConfig::default(),
            BandLayout::default(),
            SimulationParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_idle_sampler_returns_empty_frame() {
        let mut sampler = sampler();
        assert!(!sampler.is_ready());
        let frame = sampler.audio_data();
        assert!(frame.is_empty());
        assert_eq!(frame.average(0, 10), 0.0);
    }

    #[test]
    fn test_denied_falls_back_to_simulation() {
        let mut sampler = sampler();
        sampler.start(|_| Err(CaptureError::PermissionDenied("user said no".into())));

        assert!(sampler.is_ready());
        assert!(sampler.is_simulated());
        assert!(sampler.status().contains("user said no"));
        assert_eq!(sampler.audio_data().len(), 256);
    }

    #[test]
    fn test_live_source_feeds_analyser() {
        let mut sampler = sampler();
        sampler.start(|_| Ok(Box::new(ToneSource { bin: 5 }) as Box<dyn SampleSource>));

        assert!(sampler.is_ready());
        assert!(!sampler.is_simulated());
        let bands = sampler.bands();
        assert!(bands.bass > bands.high);
    }

    #[test]
    fn test_start_while_live_does_not_reopen() {
        let mut sampler = sampler();
        sampler.start(|_| Ok(Box::new(ToneSource { bin: 5 }) as Box<dyn SampleSource>));

        let mut opened = false;
        sampler.start(|_| {
            opened = true;
            Err(CaptureError::NoDevice)
        });
        assert!(!opened);
        assert!(!sampler.is_simulated());
    }

    #[test]
    fn test_retry_after_failure_can_go_live() {
        let mut sampler = sampler();
        sampler.start(|_| Err(CaptureError::NoDevice));
        assert!(sampler.is_simulated());

        sampler.start(|_| Ok(Box::new(ToneSource { bin: 5 }) as Box<dyn SampleSource>));
        assert!(!sampler.is_simulated());
    }

    #[test]
    fn test_band_description_in_hz() {
        let sampler = sampler();
        let text = sampler.describe_bands(48_000);
        assert!(text.starts_with("bass 0-938 Hz"), "{text}");
    }

    #[test]
    fn test_rejects_band_outside_bins() {
        let layout = BandLayout {
            bass: 0..400,
            ..Default::default()
        };
        let result = AudioSampler::new(
            AnalyserConfig::default(),
            layout,
            SimulationParams::default(),
        );
        assert!(result.is_err());
    }
}

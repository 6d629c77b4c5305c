//! Synthetic spectrum used when no input device is available.

use noise::{NoiseFn, Perlin};

use crate::params::{BandLayout, SimulationParams, WaveLayer};

/// Layered-sinusoid spectrum generator driven by a simulated clock.
///
/// Output depends only on the simulated time and bin index, so two
/// generators with the same parameters produce identical sequences.
pub struct SimulatedSpectrum {
    params: SimulationParams,
    layout: BandLayout,
    perlin: Perlin,
    time: f32,
    bytes: Vec<u8>,
}

impl SimulatedSpectrum {
    pub fn new(params: SimulationParams, layout: BandLayout, bin_count: usize) -> Self {
        Self {
            perlin: Perlin::new(params.noise_seed),
            params,
            layout,
            time: 0.0,
            bytes: vec![0; bin_count],
        }
    }

    /// Simulated seconds elapsed so far
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Advance the simulated clock by one step and synthesize a frame
    pub fn next_frame(&mut self) -> &[u8] {
        self.time += self.params.time_step;
        let t = self.time;
        let bins = self.bytes.len().max(1) as f32;

        // Sharp periodic kick, 0..=1
        let pulse_phase = (t / self.params.pulse_period).fract();
        let pulse = (1.0 - pulse_phase).powi(6);

        for (i, byte) in self.bytes.iter_mut().enumerate() {
            let layer = layer_for(&self.params, &self.layout, i);
            let wave = layer.offset
                + layer.amplitude * (t * layer.rate + i as f32 * layer.bin_phase).sin();

            let noise = self
                .perlin
                .get([i as f64 * self.params.noise_scale, t as f64]) as f32
                * self.params.noise_amplitude;

            let kick = self.params.pulse_amplitude * pulse * (1.0 - i as f32 / bins);

            *byte = (wave + noise + kick).clamp(0.0, 255.0) as u8;
        }

        &self.bytes
    }
}

/// Bins past the configured high band keep fading toward silence
fn layer_for(params: &SimulationParams, layout: &BandLayout, bin: usize) -> WaveLayer {
    if bin < layout.bass.end {
        params.bass
    } else if bin < layout.mid.end {
        params.mid
    } else if bin < layout.high.end {
        params.high
    } else {
        let tail = (bin - layout.high.end) as f32;
        WaveLayer {
            offset: params.high.offset * (-tail / 24.0).exp(),
            amplitude: params.high.amplitude * 0.5,
            rate: params.high.rate,
            bin_phase: params.high.bin_phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFrame;

    fn generator() -> SimulatedSpectrum {
        SimulatedSpectrum::new(SimulationParams::default(), BandLayout::default(), 256)
    }

    #[test]
    fn test_clock_advances_by_fixed_step() {
        let mut sim = generator();
        sim.next_frame();
        sim.next_frame();
        assert!((sim.time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_bass_outweighs_highs() {
        let layout = BandLayout::default();
        let mut sim = generator();
        let (mut bass, mut high) = (0.0, 0.0);

        for _ in 0..500 {
            let frame = AudioFrame::new(sim.next_frame());
            bass += frame.average_range(&layout.bass);
            high += frame.average_range(&layout.high);
        }

        assert!(bass > high * 1.5, "bass {bass} vs high {high}");
    }

    #[test]
    fn test_deterministic_sequence() {
        let mut a = generator();
        let mut b = generator();
        for _ in 0..20 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_frames_vary_over_time() {
        let mut sim = generator();
        let first = sim.next_frame().to_vec();
        let later = (0..7).map(|_| sim.next_frame().to_vec()).last().unwrap();
        assert_ne!(first, later);
    }
}

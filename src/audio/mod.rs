//! Microphone capture, frequency analysis and the simulated fallback.
//!
//! The sampler refreshes a byte magnitude array once per frame, either
//! from a live input device or from a synthetic generator, and hands out
//! a borrowed [`AudioFrame`] with a range-average query.

mod analyser;
mod capture;
mod sampler;
mod simulated;

use std::ops::Range;

pub use analyser::Analyser;
pub use capture::{CaptureError, CpalCapture, SampleSource, WavRecorder};
pub use sampler::{AudioSampler, AudioSource};
pub use simulated::SimulatedSpectrum;

use crate::params::BandLayout;

/// Normalized band energies (0..=1), the animator's audio input
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

/// Read-only view of the current magnitude array
#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    data: &'a [u8],
}

impl<'a> AudioFrame<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Frame with no bins (sampler not started)
    pub fn empty() -> Self {
        Self { data: &[] }
    }

    /// Magnitude per frequency bin, 0..=255
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arithmetic mean of bins `start..end`.
    ///
    /// `end` is clamped to the array length; an empty or inverted range
    /// yields 0.
    pub fn average(&self, start: usize, end: usize) -> f32 {
        let end = end.min(self.data.len());
        if start >= end {
            return 0.0;
        }
        let sum: u32 = self.data[start..end].iter().map(|&v| v as u32).sum();
        sum as f32 / (end - start) as f32
    }

    pub fn average_range(&self, range: &Range<usize>) -> f32 {
        self.average(range.start, range.end)
    }

    /// Band averages scaled to 0..=1
    pub fn bands(&self, layout: &BandLayout) -> AudioBands {
        AudioBands {
            bass: self.average_range(&layout.bass) / 255.0,
            mid: self.average_range(&layout.mid) / 255.0,
            high: self.average_range(&layout.high) / 255.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_ten_values_is_exact() {
        let data: Vec<u8> = (1..=10).map(|i| i * 10).collect();
        let frame = AudioFrame::new(&data);
        assert_eq!(frame.average(0, 10), 55.0);
    }

    #[test]
    fn test_average_empty_and_inverted_ranges() {
        let data = [200u8; 16];
        let frame = AudioFrame::new(&data);
        assert_eq!(frame.average(4, 4), 0.0);
        assert_eq!(frame.average(9, 3), 0.0);
        assert_eq!(frame.average(20, 30), 0.0);
    }

    #[test]
    fn test_average_clamps_end() {
        let data = [10u8, 20, 30];
        let frame = AudioFrame::new(&data);
        assert_eq!(frame.average(1, 100), 25.0);
    }

    #[test]
    fn test_average_stays_in_byte_range() {
        let data: Vec<u8> = (0..=255).collect();
        let frame = AudioFrame::new(&data);
        for start in (0..256).step_by(17) {
            for end in (0..300).step_by(13) {
                let avg = frame.average(start, end);
                assert!((0.0..=255.0).contains(&avg), "{start}..{end} -> {avg}");
            }
        }
    }

    #[test]
    fn test_empty_frame_averages_zero() {
        let frame = AudioFrame::empty();
        assert!(frame.is_empty());
        assert_eq!(frame.average(0, 10), 0.0);
        assert_eq!(frame.bands(&BandLayout::default()), AudioBands::default());
    }

    #[test]
    fn test_bands_are_normalized() {
        let data = [255u8; 256];
        let bands = AudioFrame::new(&data).bands(&BandLayout::default());
        assert_eq!(bands.bass, 1.0);
        assert_eq!(bands.mid, 1.0);
        assert_eq!(bands.high, 1.0);
    }
}

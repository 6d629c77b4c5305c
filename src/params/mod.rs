//! Parameter definitions with units and documented semantics.
//!
//! All tunable numbers live here:
//! - Units (world units, seconds, decibels, bytes)
//! - Documented ranges and meanings
//! - One preset per visual variant

mod audio;
mod env;
mod render;
mod scene;
mod tunnel;

use thiserror::Error;

// Re-export all types
pub use audio::{AnalyserConfig, BandLayout, SimulationParams, WaveLayer};
pub use env::BuildEnv;
pub use render::{RecordingConfig, RenderConfig};
pub use scene::{
    BloomParams, CameraParams, ChromaticParams, FogParams, GroundParams, LightParams,
    PostFxParams, SceneParams, StarfieldParams, VignetteParams,
};
pub use tunnel::{CursorParams, IntroCurve, TunnelParams};

/// Invalid parameter combination
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FFT size must be a power of 2 and at least 32, got {0}")]
    FftSize(usize),
    #[error("smoothing must be in [0, 1), got {0}")]
    Smoothing(f32),
    #[error("decibel range is empty: {min} dB .. {max} dB")]
    DecibelRange { min: f32, max: f32 },
    #[error("{band} band {start}..{end} does not fit in {bins} bins")]
    BandRange {
        band: &'static str,
        start: usize,
        end: usize,
        bins: usize,
    },
    #[error("particle pool must not be empty")]
    EmptyPool,
    #[error("tunnel length must be positive, got {0}")]
    TunnelLength(f32),
    #[error("mode cycle must be positive, got {0}")]
    ModeCycle(f32),
    #[error("min/max range is inverted")]
    InvertedRange,
}

/// One self-consistent parameterization of animator and scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// 2,000 particles, no interaction
    #[default]
    Classic,
    /// 5,000 particles, cursor driven, chromatic aberration
    Interactive,
    /// 10,000 particles, intro rush, reflective floor
    Hyperdrive,
}

impl Variant {
    pub fn tunnel(self) -> TunnelParams {
        match self {
            Variant::Classic => TunnelParams::classic(),
            Variant::Interactive => TunnelParams::interactive(),
            Variant::Hyperdrive => TunnelParams::hyperdrive(),
        }
    }

    pub fn scene(self) -> SceneParams {
        match self {
            Variant::Classic => SceneParams::classic(),
            Variant::Interactive => SceneParams::interactive(),
            Variant::Hyperdrive => SceneParams::hyperdrive(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Interactive => "interactive",
            Variant::Hyperdrive => "hyperdrive",
        }
    }
}

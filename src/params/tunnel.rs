//! Particle tunnel parameters, one set per visual variant.

use super::ConfigError;
use crate::tunnel::Mode;

/// Decaying speed boost applied at the start of a session
#[derive(Debug, Clone, Copy)]
pub struct IntroCurve {
    /// Extra speed multiplier at t = 0 (dimensionless)
    pub boost: f32,

    /// e-folding time of the boost (seconds)
    pub decay_s: f32,
}

/// Cursor interaction parameters
#[derive(Debug, Clone, Copy)]
pub struct CursorParams {
    /// Fraction of the remaining distance covered per frame (0..=1)
    pub damping: f32,

    /// Transverse displacement at the near end of the tunnel (world units)
    pub strength: f32,

    /// Cursor influence radius for the proximity boost (world units)
    pub proximity_radius: f32,

    /// Extra scale for a particle sitting exactly under the cursor
    pub proximity_boost: f32,
}

/// Particle field parameters with units
#[derive(Debug, Clone)]
pub struct TunnelParams {
    /// Fixed particle pool size
    pub count: usize,

    /// Tunnel length along Z (world units); z cycles in [-L/2, L/2)
    pub length: f32,

    /// Particle radius range around the tunnel axis (world units)
    pub radius_min: f32,
    pub radius_max: f32,

    /// Per-particle speed multiplier range
    pub speed_min: f32,
    pub speed_max: f32,

    /// Resting forward speed (world units per second)
    pub base_speed: f32,

    /// Extra forward speed at full bass (world units per second)
    pub bass_speed_gain: f32,

    /// Curve offset amplitude (world units)
    pub curve_amplitude: f32,

    /// Curve spatial frequency (radians per world unit along Z)
    pub curve_frequency: f32,

    /// Curve temporal rate (radians per second)
    pub curve_rate: f32,

    /// Angular twist along the tunnel (radians per world unit)
    pub twist: f32,

    /// Particle base size (world units)
    pub base_scale: f32,

    /// Spin rate range (radians per second), zero disables spin
    pub rotation_speed_max: f32,

    /// Mode cycle duration (seconds)
    pub mode_cycle_s: f32,

    /// Modes visited in order
    pub modes: [Mode; 3],

    /// Global field rotation (radians per second, scaled up by mids)
    pub field_rotation_rate: f32,

    /// Hue drift over time (turns per second)
    pub hue_drift: f32,

    /// Hue spread across particle phases (turns)
    pub hue_spread: f32,

    pub intro: Option<IntroCurve>,
    pub cursor: Option<CursorParams>,

    /// RNG seed for the particle pool
    pub seed: u64,
}

impl TunnelParams {
    /// 2,000 particles, short tunnel, no interaction
    pub fn classic() -> Self {
        Self {
            count: 2_000,
            length: 100.0,
            radius_min: 4.0,
            radius_max: 10.0,
            speed_min: 0.6,
            speed_max: 1.4,
            base_speed: 12.0,
            bass_speed_gain: 40.0,
            curve_amplitude: 2.5,
            curve_frequency: 0.05,
            curve_rate: 0.6,
            twist: 0.02,
            base_scale: 0.18,
            rotation_speed_max: 0.0,
            mode_cycle_s: 10.0,
            modes: [Mode::Flow, Mode::Pulse, Mode::Warp],
            field_rotation_rate: 0.05,
            hue_drift: 0.02,
            hue_spread: 0.15,
            intro: None,
            cursor: None,
            seed: 1,
        }
    }

    /// 5,000 spinning particles following the cursor
    pub fn interactive() -> Self {
        Self {
            count: 5_000,
            length: 150.0,
            radius_min: 3.0,
            radius_max: 12.0,
            speed_min: 0.5,
            speed_max: 1.5,
            base_speed: 15.0,
            bass_speed_gain: 50.0,
            curve_amplitude: 3.5,
            curve_frequency: 0.04,
            curve_rate: 0.5,
            twist: 0.03,
            base_scale: 0.15,
            rotation_speed_max: 2.0,
            mode_cycle_s: 8.0,
            modes: [Mode::Flow, Mode::Spiral, Mode::Pulse],
            field_rotation_rate: 0.08,
            hue_drift: 0.03,
            hue_spread: 0.25,
            intro: None,
            cursor: Some(CursorParams {
                damping: 0.05,
                strength: 6.0,
                proximity_radius: 3.0,
                proximity_boost: 1.5,
            }),
            seed: 2,
        }
    }

    /// 10,000 particles, long tunnel, intro rush
    pub fn hyperdrive() -> Self {
        Self {
            count: 10_000,
            length: 300.0,
            radius_min: 2.5,
            radius_max: 14.0,
            speed_min: 0.7,
            speed_max: 1.8,
            base_speed: 20.0,
            bass_speed_gain: 80.0,
            curve_amplitude: 5.0,
            curve_frequency: 0.025,
            curve_rate: 0.4,
            twist: 0.015,
            base_scale: 0.12,
            rotation_speed_max: 3.0,
            mode_cycle_s: 12.0,
            modes: [Mode::Warp, Mode::Spiral, Mode::Pulse],
            field_rotation_rate: 0.1,
            hue_drift: 0.04,
            hue_spread: 0.3,
            intro: Some(IntroCurve {
                boost: 6.0,
                decay_s: 4.0,
            }),
            cursor: Some(CursorParams {
                damping: 0.04,
                strength: 8.0,
                proximity_radius: 4.0,
                proximity_boost: 1.2,
            }),
            seed: 3,
        }
    }

    pub fn half_length(&self) -> f32 {
        self.length * 0.5
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.length <= 0.0 || !self.length.is_finite() {
            return Err(ConfigError::TunnelLength(self.length));
        }
        if self.mode_cycle_s <= 0.0 {
            return Err(ConfigError::ModeCycle(self.mode_cycle_s));
        }
        if self.radius_min > self.radius_max || self.speed_min > self.speed_max {
            return Err(ConfigError::InvertedRange);
        }
        Ok(())
    }
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for params in [
            TunnelParams::classic(),
            TunnelParams::interactive(),
            TunnelParams::hyperdrive(),
        ] {
            assert!(params.validate().is_ok(), "{:?}", params.count);
        }
    }

    #[test]
    fn test_pool_sizes_span_variants() {
        assert_eq!(TunnelParams::classic().count, 2_000);
        assert_eq!(TunnelParams::hyperdrive().count, 10_000);
    }

    #[test]
    fn test_rejects_zero_length() {
        let mut params = TunnelParams::classic();
        params.length = 0.0;
        assert!(matches!(
            params.validate(),
            Err(ConfigError::TunnelLength(_))
        ));
    }
}

//! Time-driven visual modes.

/// Visual style applied to rotation, scale and palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Gentle drift, scale breathes with bass
    Flow,
    /// Particles throb with the mids
    Pulse,
    /// Fast spin, arms twist harder
    Spiral,
    /// Particles stretch into streaks along the tunnel
    Warp,
}

impl Mode {
    /// Palette anchor (turns)
    pub fn base_hue(self) -> f32 {
        match self {
            Mode::Flow => 0.55,
            Mode::Pulse => 0.9,
            Mode::Spiral => 0.75,
            Mode::Warp => 0.05,
        }
    }

    /// Extra twist multiplier applied to the tunnel's angular twist
    pub fn twist_factor(self) -> f32 {
        match self {
            Mode::Spiral => 3.0,
            _ => 1.0,
        }
    }
}

/// Index into a mode list: `floor(elapsed / cycle) mod count`.
///
/// Negative or non-finite elapsed time maps to the first mode.
pub fn mode_index(elapsed_s: f32, cycle_s: f32, count: usize) -> usize {
    if count == 0 || !(elapsed_s.is_finite() && cycle_s > 0.0) || elapsed_s < 0.0 {
        return 0;
    }
    (elapsed_s / cycle_s).floor() as usize % count
}

/// Active mode at `elapsed_s`
pub fn mode_at(modes: &[Mode; 3], elapsed_s: f32, cycle_s: f32) -> Mode {
    modes[mode_index(elapsed_s, cycle_s, modes.len())]
}

//! Audio-reactive particle tunnel.
//!
//! A fixed pool of particles travels along Z, wraps at the tunnel ends and
//! is rewritten into an instance buffer every frame. Each particle update
//! only reads that particle and per-frame shared values.

mod animator;
mod color;
mod instance;
mod mode;
mod particle;

pub use animator::{wrap_z, FrameInput, FrameOutcome, TunnelAnimator};
pub use color::hsl_to_rgb;
pub use instance::{InstanceBuffer, InstanceRaw};
pub use mode::{mode_at, mode_index, Mode};
pub use particle::{spawn_pool, Particle};

//! Fixed particle pool seeded once at startup.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::TunnelParams;

/// One recyclable tunnel particle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Angle around the tunnel axis (radians)
    pub angle: f32,
    /// Distance from the tunnel axis (world units)
    pub radius: f32,
    /// Longitudinal coordinate, kept in [-L/2, L/2)
    pub z: f32,
    /// Speed multiplier
    pub speed: f32,
    /// Colour phase, 0..1
    pub phase: f32,
    /// Spin rate (radians per second), 0 when the variant does not spin
    pub rotation_speed: f32,
}

/// Build the pool for `params`, deterministic for a given seed
pub fn spawn_pool(params: &TunnelParams) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let half = params.half_length();

    (0..params.count)
        .map(|_| Particle {
            angle: rng.gen_range(0.0..TAU),
            radius: sample_range(&mut rng, params.radius_min, params.radius_max),
            z: rng.gen_range(-half..half),
            speed: sample_range(&mut rng, params.speed_min, params.speed_max),
            phase: rng.gen::<f32>(),
            rotation_speed: if params.rotation_speed_max > 0.0 {
                rng.gen_range(-params.rotation_speed_max..params.rotation_speed_max)
            } else {
                0.0
            },
        })
        .collect()
}

/// Uniform in [min, max], tolerating min == max
fn sample_range(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_matches_count_and_bounds() {
        let params = TunnelParams::interactive();
        let pool = spawn_pool(&params);
        assert_eq!(pool.len(), params.count);

        let half = params.half_length();
        for p in &pool {
            assert!(p.z >= -half && p.z < half);
            assert!(p.radius >= params.radius_min && p.radius <= params.radius_max);
            assert!((0.0..1.0).contains(&p.phase));
            assert!(p.rotation_speed.abs() <= params.rotation_speed_max);
        }
    }

    #[test]
    fn test_pool_is_seeded() {
        let params = TunnelParams::classic();
        assert_eq!(spawn_pool(&params), spawn_pool(&params));
    }

    #[test]
    fn test_non_spinning_variant_has_zero_rotation() {
        let pool = spawn_pool(&TunnelParams::classic());
        assert!(pool.iter().all(|p| p.rotation_speed == 0.0));
    }
}

//! Per-frame particle update: audio + time + cursor → instance transforms.

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec2, Vec3};

use super::color::hsl_to_rgb;
use super::instance::{InstanceBuffer, InstanceRaw};
use super::mode::{mode_at, Mode};
use super::particle::{spawn_pool, Particle};
use crate::audio::AudioBands;
use crate::params::{ConfigError, CursorParams, TunnelParams};
use crate::scene::RenderContext;

/// Inputs sampled once per display refresh
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// Seconds since the session started
    pub elapsed_s: f32,
    /// Seconds since the previous frame
    pub dt_s: f32,
    /// Cursor in normalized device coordinates (-1..1, +Y up)
    pub cursor: Vec2,
    pub bands: AudioBands,
}

/// Result of one animator step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No destination buffer yet, nothing changed
    Skipped,
    /// Every instance slot was rewritten
    Updated { mode: Mode, count: usize },
}

/// Values shared by every particle in one frame
struct FrameTerms {
    t: f32,
    advance: f32,
    mode: Mode,
    bands: AudioBands,
    cursor_offset: Vec2,
    cursor_world: Vec2,
}

/// Owns the particle pool and rewrites the instance buffer every frame
pub struct TunnelAnimator {
    params: TunnelParams,
    particles: Vec<Particle>,
}

impl TunnelAnimator {
    pub fn new(params: TunnelParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let particles = spawn_pool(&params);
        Ok(Self { params, particles })
    }

    pub fn params(&self) -> &TunnelParams {
        &self.params
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }

    /// Destination buffer sized to this pool
    pub fn instance_buffer(&self) -> InstanceBuffer {
        InstanceBuffer::new(self.particles.len())
    }

    pub fn mode_at(&self, elapsed_s: f32) -> Mode {
        mode_at(&self.params.modes, elapsed_s, self.params.mode_cycle_s)
    }

    /// Speed multiplier from the intro curve (1 when the variant has none)
    pub fn intro_factor(&self, elapsed_s: f32) -> f32 {
        match self.params.intro {
            Some(intro) if intro.decay_s > 0.0 => {
                1.0 + intro.boost * (-elapsed_s.max(0.0) / intro.decay_s).exp()
            }
            _ => 1.0,
        }
    }

    /// Advance every particle and write its transform and colour.
    ///
    /// A missing or mis-sized buffer skips the frame without touching
    /// particle or context state.
    pub fn update(
        &mut self,
        input: &FrameInput,
        ctx: &mut RenderContext,
        instances: Option<&mut InstanceBuffer>,
    ) -> FrameOutcome {
        let Some(instances) = instances else {
            return FrameOutcome::Skipped;
        };
        if instances.len() != self.particles.len() {
            log::warn!(
                "Instance buffer holds {} slots for {} particles, skipping frame",
                instances.len(),
                self.particles.len()
            );
            return FrameOutcome::Skipped;
        }

        let bands = input.bands;
        let mode = self.mode_at(input.elapsed_s);
        let dt = input.dt_s.max(0.0);

        if let Some(cursor) = self.params.cursor {
            ctx.cursor += (input.cursor - ctx.cursor) * cursor.damping.clamp(0.0, 1.0);
        }

        ctx.field_rotation = (ctx.field_rotation
            + dt * self.params.field_rotation_rate * (1.0 + bands.mid * 2.0))
            .rem_euclid(TAU);

        // The renderer spins the whole field by `field_rotation`, so cursor
        // terms are expressed in the unrotated particle frame
        let to_field = Vec2::from_angle(-ctx.field_rotation);
        let terms = FrameTerms {
            t: input.elapsed_s,
            advance: (self.params.base_speed + bands.bass * self.params.bass_speed_gain)
                * self.intro_factor(input.elapsed_s)
                * dt,
            mode,
            bands,
            cursor_offset: to_field.rotate(cursor_offset(self.params.cursor, ctx.cursor)),
            cursor_world: to_field.rotate(ctx.cursor * self.params.radius_max),
        };

        for (particle, slot) in self
            .particles
            .iter_mut()
            .zip(instances.as_mut_slice().iter_mut())
        {
            *slot = animate_particle(particle, &terms, &self.params);
        }

        ctx.light.pulse(&bands);

        FrameOutcome::Updated {
            mode,
            count: self.particles.len(),
        }
    }
}

fn cursor_offset(cursor: Option<CursorParams>, damped: Vec2) -> Vec2 {
    cursor.map_or(Vec2::ZERO, |c| damped * c.strength)
}

/// Wrap `z` into [-length/2, length/2]
pub fn wrap_z(z: f32, length: f32) -> f32 {
    let half = length * 0.5;
    (z + half).rem_euclid(length) - half
}

/// Update one particle in place and build its instance.
///
/// Reads only the particle itself and per-frame shared terms.
fn animate_particle(p: &mut Particle, f: &FrameTerms, params: &TunnelParams) -> InstanceRaw {
    let length = params.length;
    p.z = wrap_z(p.z + f.advance * p.speed, length);

    // 0 at the far end, 1 at the near end
    let depth = ((p.z + params.half_length()) / length).clamp(0.0, 1.0);
    let t = f.t;
    let bands = f.bands;

    let angle = p.angle + p.z * params.twist * f.mode.twist_factor();
    let radius = p.radius * (1.0 + bands.bass * 0.15);
    let curve = Vec2::new(
        (p.z * params.curve_frequency + t * params.curve_rate).sin() * params.curve_amplitude,
        (p.z * params.curve_frequency * 0.7 + t * params.curve_rate * 0.8).cos()
            * params.curve_amplitude
            * 0.6,
    );
    let xy = Vec2::new(angle.cos(), angle.sin()) * radius + curve + f.cursor_offset * depth;

    let spin = t * p.rotation_speed + p.phase * TAU;
    let base = params.base_scale;
    let (rotation, mut scale) = match f.mode {
        Mode::Flow => (
            Quat::from_euler(EulerRot::XYZ, spin, spin * 0.5, 0.0),
            Vec3::splat(base * (1.0 + bands.bass * 0.8)),
        ),
        Mode::Pulse => {
            let throb = (t * 4.0 + p.phase * TAU).sin().abs();
            (
                Quat::from_euler(EulerRot::XYZ, spin, spin, 0.0),
                Vec3::splat(base * (1.0 + bands.mid * 1.5 * throb)),
            )
        }
        Mode::Spiral => (
            Quat::from_euler(EulerRot::XYZ, spin * 2.0, 0.0, angle),
            Vec3::splat(base * (1.0 + bands.high)),
        ),
        Mode::Warp => {
            let s = base * (1.0 + bands.bass * 0.5);
            (
                Quat::from_rotation_z(angle),
                Vec3::new(s, s, s * (2.0 + bands.bass * 8.0)),
            )
        }
    };

    if let Some(cursor) = params.cursor {
        let d = (xy - f.cursor_world).length();
        if cursor.proximity_radius > 0.0 && d < cursor.proximity_radius {
            scale *= 1.0 + cursor.proximity_boost * (1.0 - d / cursor.proximity_radius);
        }
    }

    let hue = f.mode.base_hue()
        + t * params.hue_drift
        + p.phase * params.hue_spread
        + bands.mid * 0.1;
    let saturation = 0.6 + bands.high * 0.4;
    let lightness = 0.35 + bands.bass * 0.35 + depth * 0.1;
    let [r, g, b] = hsl_to_rgb(hue, saturation, lightness);

    InstanceRaw::new(
        Vec3::new(xy.x, xy.y, p.z),
        rotation,
        scale,
        [r, g, b, 1.0],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SceneParams;

    fn context() -> RenderContext {
        RenderContext::new(&SceneParams::default())
    }

    fn input(elapsed_s: f32, dt_s: f32, bass: f32) -> FrameInput {
        FrameInput {
            elapsed_s,
            dt_s,
            cursor: Vec2::ZERO,
            bands: AudioBands {
                bass,
                mid: 0.5,
                high: 0.25,
            },
        }
    }

    #[test]
    fn test_wrap_z_bounds() {
        for &z in &[-1000.0, -50.0, -49.9, 0.0, 49.9, 50.0, 151.0, 1e6] {
            let w = wrap_z(z, 100.0);
            assert!((-50.0..=50.0).contains(&w), "{z} wrapped to {w}");
        }
        assert!((wrap_z(60.0, 100.0) + 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_z_stays_in_tunnel_for_any_delta() {
        let mut animator = TunnelAnimator::new(TunnelParams::hyperdrive()).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();
        let half = animator.params().half_length();

        let mut elapsed = 0.0;
        for &dt in &[0.0, 0.001, 0.016, 0.1, 0.5, 2.0, 10.0] {
            elapsed += dt;
            animator.update(&input(elapsed, dt, 1.0), &mut ctx, Some(&mut buffer));
            for p in animator.particles() {
                assert!(p.z >= -half && p.z <= half, "z {} out of bounds", p.z);
            }
        }
    }

    #[test]
    fn test_every_mode_fills_every_slot() {
        let mut animator = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();
        let cycle = animator.params().mode_cycle_s;

        for k in 0..3 {
            let elapsed = cycle * k as f32 + 0.5;
            let outcome = animator.update(&input(elapsed, 0.016, 0.7), &mut ctx, Some(&mut buffer));
            assert_eq!(
                outcome,
                FrameOutcome::Updated {
                    mode: animator.params().modes[k],
                    count: 2_000
                }
            );
            assert_eq!(buffer.len(), 2_000);
            assert!(buffer
                .as_slice()
                .iter()
                .all(|inst| inst.color[3] == 1.0 && inst.model[3][3] == 1.0));
        }
    }

    #[test]
    fn test_missing_buffer_skips_without_mutation() {
        let mut animator = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        let mut ctx = context();
        let before = animator.particles().to_vec();
        let rotation = ctx.field_rotation;

        let outcome = animator.update(&input(1.0, 0.5, 1.0), &mut ctx, None);
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(animator.particles(), before.as_slice());
        assert_eq!(ctx.field_rotation, rotation);
    }

    #[test]
    fn test_wrong_sized_buffer_is_skipped() {
        let mut animator = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        let mut ctx = context();
        let mut small = InstanceBuffer::new(10);
        let outcome = animator.update(&input(1.0, 0.016, 0.0), &mut ctx, Some(&mut small));
        assert_eq!(outcome, FrameOutcome::Skipped);
    }

    #[test]
    fn test_bass_speeds_up_travel() {
        let params = TunnelParams::classic();
        let mut quiet = TunnelAnimator::new(params.clone()).unwrap();
        let mut loud = TunnelAnimator::new(params).unwrap();
        let mut ctx = context();
        let mut buffer = quiet.instance_buffer();

        // Small step so nothing wraps
        quiet.update(&input(0.0, 0.001, 0.0), &mut ctx, Some(&mut buffer));
        loud.update(&input(0.0, 0.001, 1.0), &mut ctx, Some(&mut buffer));

        let start = spawn_pool(quiet.params());
        let moved = |a: &TunnelAnimator| -> f32 {
            a.particles()
                .iter()
                .zip(&start)
                .map(|(p, s)| (p.z - s.z).rem_euclid(quiet.params().length))
                .sum()
        };
        assert!(moved(&loud) > moved(&quiet));
    }

    #[test]
    fn test_intro_curve_decays() {
        let animator = TunnelAnimator::new(TunnelParams::hyperdrive()).unwrap();
        assert!(animator.intro_factor(0.0) > 6.9);
        assert!(animator.intro_factor(60.0) < 1.001);

        let classic = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        assert_eq!(classic.intro_factor(0.0), 1.0);
    }

    #[test]
    fn test_cursor_is_damped() {
        let mut animator = TunnelAnimator::new(TunnelParams::interactive()).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();

        let mut frame = input(0.0, 0.016, 0.0);
        frame.cursor = Vec2::new(1.0, 0.0);
        animator.update(&frame, &mut ctx, Some(&mut buffer));

        assert!(ctx.cursor.x > 0.0 && ctx.cursor.x < 0.1);
    }

    #[test]
    fn test_cursor_ignored_without_interaction() {
        let mut animator = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();

        let mut frame = input(0.0, 0.016, 0.0);
        frame.cursor = Vec2::new(1.0, 1.0);
        animator.update(&frame, &mut ctx, Some(&mut buffer));

        assert_eq!(ctx.cursor, Vec2::ZERO);
    }

    #[test]
    fn test_light_and_field_rotation_follow_audio() {
        let mut animator = TunnelAnimator::new(TunnelParams::classic()).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();

        animator.update(&input(0.0, 0.1, 0.0), &mut ctx, Some(&mut buffer));
        let quiet = ctx.light.intensity;
        animator.update(&input(0.1, 0.1, 1.0), &mut ctx, Some(&mut buffer));

        assert!(ctx.light.intensity > quiet);
        assert!(ctx.field_rotation > 0.0);
    }

    #[test]
    fn test_proximity_boost_lands_under_cursor_after_field_rotation() {
        let params = TunnelParams::interactive();
        let cursor = params.cursor.unwrap();
        let mut plain_params = params.clone();
        plain_params.cursor = Some(CursorParams {
            proximity_boost: 0.0,
            ..cursor
        });

        let mut boosted = TunnelAnimator::new(params.clone()).unwrap();
        let mut plain = TunnelAnimator::new(plain_params).unwrap();
        let mut ctx = context();
        ctx.cursor = Vec2::new(0.8, 0.0);
        ctx.field_rotation = 4.8;
        let mut plain_ctx = ctx;
        let mut boosted_buf = boosted.instance_buffer();
        let mut plain_buf = plain.instance_buffer();

        let mut frame = input(30.0, 0.016, 0.0);
        frame.cursor = ctx.cursor;
        boosted.update(&frame, &mut ctx, Some(&mut boosted_buf));
        plain.update(&frame, &mut plain_ctx, Some(&mut plain_buf));

        // Where the renderer draws the cursor point and each instance
        let cursor_point = ctx.cursor * params.radius_max;
        let drawn = glam::Mat2::from_angle(ctx.field_rotation);

        let mut hits = 0;
        for (a, b) in boosted_buf.as_slice().iter().zip(plain_buf.as_slice()) {
            let (scale, _, translation) =
                glam::Mat4::from_cols_array_2d(&a.model).to_scale_rotation_translation();
            let (plain_scale, _, _) =
                glam::Mat4::from_cols_array_2d(&b.model).to_scale_rotation_translation();
            if scale.x > plain_scale.x * 1.001 {
                hits += 1;
                let on_screen = drawn * translation.truncate();
                let d = (on_screen - cursor_point).length();
                assert!(d < cursor.proximity_radius + 1e-3, "boosted instance drawn {d} away");
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn test_warp_mode_stretches_along_z() {
        let mut params = TunnelParams::classic();
        params.modes = [Mode::Warp; 3];
        params.curve_amplitude = 0.0;
        let mut animator = TunnelAnimator::new(params).unwrap();
        let mut ctx = context();
        let mut buffer = animator.instance_buffer();

        animator.update(&input(0.0, 0.0, 1.0), &mut ctx, Some(&mut buffer));
        let model = glam::Mat4::from_cols_array_2d(&buffer.as_slice()[0].model);
        let (scale, _, _) = model.to_scale_rotation_translation();
        assert!(scale.z > scale.x * 2.0);
    }
}

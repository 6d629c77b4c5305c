//! Presentation shell: explicit per-frame render context and the static
//! scene pieces (starfield, ground plane) composed around the tunnel.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::AudioBands;
use crate::params::{GroundParams, LightParams, SceneParams, StarfieldParams};
use crate::tunnel::hsl_to_rgb;

/// Camera pose for the current frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
}

/// Point light pulsed by the animator
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    params: LightParams,
    pub position: Vec3,
    pub intensity: f32,
    /// Linear RGB
    pub color: [f32; 3],
}

impl PointLight {
    pub fn new(params: LightParams) -> Self {
        let mut light = Self {
            params,
            position: Vec3::from_array(params.position),
            intensity: 0.0,
            color: [0.0; 3],
        };
        light.pulse(&AudioBands::default());
        light
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.params.ambient
    }

    /// Intensity follows bass, hue follows highs
    pub fn pulse(&mut self, bands: &AudioBands) {
        self.intensity = self.params.base_intensity + bands.bass * self.params.bass_gain;
        self.color = hsl_to_rgb(
            self.params.base_hue + bands.high * self.params.high_hue_shift,
            0.8,
            0.6,
        );
    }
}

/// State shared between animator, camera rig and renderer for one frame.
///
/// Passed explicitly into every per-frame update.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext {
    pub camera: CameraState,
    pub light: PointLight,
    /// Slow rotation of the whole particle field about Z (radians)
    pub field_rotation: f32,
    /// Damped cursor in normalized device coordinates
    pub cursor: Vec2,
}

impl RenderContext {
    pub fn new(scene: &SceneParams) -> Self {
        Self {
            camera: CameraState {
                eye: Vec3::from_array(scene.camera.start_position),
                target: Vec3::from_array(scene.camera.look_at),
                fov_degrees: scene.camera.fov_degrees,
            },
            light: PointLight::new(scene.light),
            field_rotation: 0.0,
            cursor: Vec2::ZERO,
        }
    }
}

/// Window pixel position → normalized device coordinates (+Y up)
pub fn cursor_to_ndc(position: (f64, f64), window_size: (u32, u32)) -> Vec2 {
    let (w, h) = (window_size.0.max(1) as f64, window_size.1.max(1) as f64);
    let x = (position.0 / w) * 2.0 - 1.0;
    let y = 1.0 - (position.1 / h) * 2.0;
    Vec2::new(x as f32, y as f32).clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// One backdrop star
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub brightness: f32,
}

/// Stars spread uniformly over a spherical shell around the origin
pub fn generate_starfield(params: &StarfieldParams) -> Vec<StarVertex> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let (inner, outer) = if params.outer_radius > params.inner_radius {
        (params.inner_radius, params.outer_radius)
    } else {
        (params.inner_radius, params.inner_radius + f32::EPSILON)
    };

    (0..params.count)
        .map(|_| {
            let cos_theta: f32 = rng.gen_range(-1.0..1.0);
            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
            let phi = rng.gen_range(0.0..TAU);
            let r = rng.gen_range(inner..outer);
            StarVertex {
                position: [
                    r * sin_theta * phi.cos(),
                    r * sin_theta * phi.sin(),
                    r * cos_theta,
                ],
                brightness: rng.gen_range(0.3..1.0),
            }
        })
        .collect()
}

/// Ground plane vertex (position only, shading happens in the shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GroundVertex {
    pub position: [f32; 3],
}

/// Two triangles covering the ground square
pub fn ground_quad(params: &GroundParams) -> [GroundVertex; 6] {
    let e = params.half_extent;
    let y = params.height;
    let corner = |x: f32, z: f32| GroundVertex {
        position: [x, y, z],
    };
    // Counter-clockwise seen from above
    [
        corner(-e, -e),
        corner(-e, e),
        corner(e, e),
        corner(-e, -e),
        corner(e, e),
        corner(e, -e),
    ]
}

/// Static scene geometry for a variant
pub struct Scene {
    pub params: SceneParams,
    pub stars: Vec<StarVertex>,
    pub ground: Option<[GroundVertex; 6]>,
}

impl Scene {
    pub fn new(params: SceneParams) -> Self {
        let stars = generate_starfield(&params.starfield);
        let ground = params.ground.as_ref().map(ground_quad);
        log::debug!(
            "Scene: {} stars, ground plane {}",
            stars.len(),
            if ground.is_some() { "on" } else { "off" }
        );
        Self {
            params,
            stars,
            ground,
        }
    }
}

//! Camera rig: idle sway, cursor parallax and a bass-driven FOV kick.

use glam::{Mat4, Vec3};

use crate::audio::AudioBands;
use crate::params::{CameraParams, RenderConfig};
use crate::scene::{CameraState, RenderContext};

/// Procedural camera driven by time, damped cursor and bass
pub struct CameraRig {
    params: CameraParams,
}

impl CameraRig {
    pub fn new(params: CameraParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    /// Compute camera pose for given time
    ///
    /// # Arguments
    /// * `time_s` - Seconds since session start
    /// * `ctx` - Render context (damped cursor is read, camera is written)
    /// * `bands` - Current band energies
    pub fn update(&self, time_s: f32, ctx: &mut RenderContext, bands: &AudioBands) {
        ctx.camera = self.pose(time_s, ctx, bands);
    }

    fn pose(&self, time_s: f32, ctx: &RenderContext, bands: &AudioBands) -> CameraState {
        let p = &self.params;
        let start = Vec3::from_array(p.start_position);

        // Layered sines keep the idle motion from looking periodic
        let sway = Vec3::new(
            (time_s * p.sway_rate).sin() * p.sway_amplitude[0],
            (time_s * p.sway_rate * 0.7).cos() * p.sway_amplitude[1],
            0.0,
        );
        let parallax = ctx.cursor.extend(0.0) * p.cursor_parallax;
        let eye = start + sway + parallax;

        // Look target trails the eye so the tunnel axis stays centred
        let target = Vec3::from_array(p.look_at) + (sway + parallax) * 0.5;

        CameraState {
            eye,
            target,
            fov_degrees: p.fov_degrees + bands.bass * p.bass_fov_kick_degrees,
        }
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn view_proj(&self, camera: &CameraState, render_config: &RenderConfig) -> (Mat4, Vec3) {
        // Always keep Y as up vector (camera never rolls)
        let view = Mat4::look_at_rh(camera.eye, camera.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            camera.fov_degrees.clamp(1.0, 170.0).to_radians(),
            render_config.aspect_ratio(),
            self.params.near_plane,
            self.params.far_plane,
        );

        (proj * view, camera.eye)
    }
}

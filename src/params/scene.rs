//! Presentation parameters: camera, fog, lights, backdrop and post chain.

/// Camera rig parameters
#[derive(Debug, Clone)]
pub struct CameraParams {
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Extra field of view at full bass (degrees)
    pub bass_fov_kick_degrees: f32,

    /// Start position (world units)
    pub start_position: [f32; 3],

    /// Point the camera looks at when undisturbed (world units)
    pub look_at: [f32; 3],

    /// Idle sway amplitude on X / Y (world units)
    pub sway_amplitude: [f32; 2],

    /// Idle sway rate (radians per second)
    pub sway_rate: f32,

    /// Eye displacement per unit of damped cursor (world units)
    pub cursor_parallax: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            bass_fov_kick_degrees: 6.0,
            start_position: [0.0, 0.0, 5.0],
            look_at: [0.0, 0.0, -50.0],
            sway_amplitude: [0.8, 0.5],
            sway_rate: 0.3,
            cursor_parallax: 0.0,
            near_plane: 0.1,
            far_plane: 1000.0,
        }
    }
}

/// Smoothstep distance fog between `near` and `far`.
///
/// The opaque ground mixes toward `color`; additively blended particles
/// fade to black.
#[derive(Debug, Clone, Copy)]
pub struct FogParams {
    /// Linear RGB
    pub color: [f32; 3],

    /// Distance where fog starts (world units)
    pub near: f32,

    /// Distance where fog is opaque (world units)
    pub far: f32,
}

/// Point light that pulses with the music
#[derive(Debug, Clone, Copy)]
pub struct LightParams {
    /// Ambient term added to every particle (linear RGB)
    pub ambient: [f32; 3],

    /// Point light position (world units)
    pub position: [f32; 3],

    /// Intensity at silence
    pub base_intensity: f32,

    /// Extra intensity at full bass
    pub bass_gain: f32,

    /// Hue at silence (turns)
    pub base_hue: f32,

    /// Hue shift at full highs (turns)
    pub high_hue_shift: f32,
}

/// Reflective ground plane under the tunnel
#[derive(Debug, Clone, Copy)]
pub struct GroundParams {
    /// Plane height (world units)
    pub height: f32,

    /// Half extent of the square plane (world units)
    pub half_extent: f32,

    /// Fraction of the light colour mirrored back (0..=1)
    pub reflectivity: f32,

    /// Base colour (linear RGB)
    pub color: [f32; 3],
}

/// Spherical-shell starfield backdrop
#[derive(Debug, Clone, Copy)]
pub struct StarfieldParams {
    pub count: usize,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub seed: u64,
}

/// Luminance-thresholded bloom
#[derive(Debug, Clone, Copy)]
pub struct BloomParams {
    /// Luminance above which pixels bloom
    pub threshold: f32,

    /// Bloom contribution in the composite
    pub strength: f32,

    /// Blur radius in half-resolution texels
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct VignetteParams {
    /// Radius where darkening starts (0 = centre, 1 = corner)
    pub offset: f32,

    /// Darkening at the corners (0..=1)
    pub darkness: f32,
}

/// Radial chromatic aberration
#[derive(Debug, Clone, Copy)]
pub struct ChromaticParams {
    /// Channel offset at the screen edge (UV units)
    pub strength: f32,
}

/// Fixed post-processing chain
#[derive(Debug, Clone, Copy)]
pub struct PostFxParams {
    pub bloom: BloomParams,
    pub vignette: VignetteParams,
    pub chromatic: Option<ChromaticParams>,
    /// Exposure applied before tone mapping
    pub exposure: f32,
}

impl Default for PostFxParams {
    fn default() -> Self {
        Self {
            bloom: BloomParams {
                threshold: 0.6,
                strength: 1.2,
                radius: 1.5,
            },
            vignette: VignetteParams {
                offset: 0.45,
                darkness: 0.6,
            },
            chromatic: None,
            exposure: 1.0,
        }
    }
}

/// Complete declarative scene composition for one variant
#[derive(Debug, Clone)]
pub struct SceneParams {
    pub camera: CameraParams,
    pub fog: FogParams,
    pub light: LightParams,
    pub ground: Option<GroundParams>,
    pub starfield: StarfieldParams,
    pub post: PostFxParams,
    /// Clear colour (linear RGB)
    pub background: [f32; 3],
}

impl SceneParams {
    pub fn classic() -> Self {
        Self {
            camera: CameraParams::default(),
            fog: FogParams {
                color: [0.0, 0.0, 0.02],
                near: 20.0,
                far: 90.0,
            },
            light: LightParams {
                ambient: [0.08, 0.08, 0.12],
                position: [0.0, 0.0, 0.0],
                base_intensity: 1.0,
                bass_gain: 3.0,
                base_hue: 0.6,
                high_hue_shift: 0.25,
            },
            ground: None,
            starfield: StarfieldParams {
                count: 1_500,
                inner_radius: 200.0,
                outer_radius: 400.0,
                seed: 11,
            },
            post: PostFxParams::default(),
            background: [0.0, 0.0, 0.02],
        }
    }

    pub fn interactive() -> Self {
        Self {
            camera: CameraParams {
                cursor_parallax: 1.5,
                ..Default::default()
            },
            fog: FogParams {
                color: [0.01, 0.0, 0.03],
                near: 30.0,
                far: 140.0,
            },
            light: LightParams {
                ambient: [0.1, 0.06, 0.14],
                position: [0.0, 0.0, -10.0],
                base_intensity: 1.2,
                bass_gain: 4.0,
                base_hue: 0.8,
                high_hue_shift: 0.3,
            },
            ground: None,
            starfield: StarfieldParams {
                count: 3_000,
                inner_radius: 250.0,
                outer_radius: 500.0,
                seed: 12,
            },
            post: PostFxParams {
                chromatic: Some(ChromaticParams { strength: 0.004 }),
                ..Default::default()
            },
            background: [0.01, 0.0, 0.03],
        }
    }

    pub fn hyperdrive() -> Self {
        Self {
            camera: CameraParams {
                fov_degrees: 85.0,
                bass_fov_kick_degrees: 12.0,
                start_position: [0.0, 1.0, 8.0],
                cursor_parallax: 2.0,
                far_plane: 1500.0,
                ..Default::default()
            },
            fog: FogParams {
                color: [0.0, 0.01, 0.02],
                near: 60.0,
                far: 280.0,
            },
            light: LightParams {
                ambient: [0.05, 0.08, 0.1],
                position: [0.0, 2.0, -20.0],
                base_intensity: 1.5,
                bass_gain: 6.0,
                base_hue: 0.5,
                high_hue_shift: 0.35,
            },
            ground: Some(GroundParams {
                height: -16.0,
                half_extent: 400.0,
                reflectivity: 0.35,
                color: [0.01, 0.01, 0.015],
            }),
            starfield: StarfieldParams {
                count: 5_000,
                inner_radius: 400.0,
                outer_radius: 800.0,
                seed: 13,
            },
            post: PostFxParams {
                bloom: BloomParams {
                    threshold: 0.5,
                    strength: 1.6,
                    radius: 2.0,
                },
                vignette: VignetteParams {
                    offset: 0.4,
                    darkness: 0.7,
                },
                chromatic: Some(ChromaticParams { strength: 0.006 }),
                exposure: 1.1,
            },
            background: [0.0, 0.01, 0.02],
        }
    }
}

impl Default for SceneParams {
    fn default() -> Self {
        Self::classic()
    }
}

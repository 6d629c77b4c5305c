//! Command-line argument parsing.

use std::path::Path;

use clap::Parser;

use crate::params::{RecordingConfig, RenderConfig, SceneParams, TunnelParams, Variant};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Vibetunnel")]
#[command(about = "Audio-reactive 3D particle tunnel", long_about = None)]
pub struct Args {
    /// Visual variant
    #[arg(long, value_enum, default_value_t = Variant::Classic)]
    pub variant: Variant,

    /// Skip the microphone and drive visuals from simulated audio
    #[arg(long)]
    pub simulate: bool,

    /// Request the microphone at startup instead of waiting for a key press
    #[arg(long)]
    pub autostart: bool,

    /// Input device name (substring match, case-insensitive)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Override the particle spawn seed
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Record frames and microphone input (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Tunnel preset for the chosen variant with CLI overrides applied
    pub fn tunnel_params(&self) -> TunnelParams {
        let mut params = self.variant.tunnel();
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        params
    }

    pub fn scene_params(&self) -> SceneParams {
        self.variant.scene()
    }

    pub fn render_config(&self) -> RenderConfig {
        let defaults = RenderConfig::default();
        RenderConfig {
            window_width: self.width.unwrap_or(defaults.window_width),
            window_height: self.height.unwrap_or(defaults.window_height),
            title: format!("{} - {}", defaults.title, self.variant.name()),
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> std::io::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(Path::new(&config.frames_dir()))?;
        log::info!(
            "Recording {} frames to {}/",
            config.total_frames(),
            config.output_dir
        );
        Ok(Some(config))
    }
}

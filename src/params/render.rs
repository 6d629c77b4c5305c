//! Window and recording configuration.

/// Window configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Base window title, the audio status is appended to it
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            title: "Vibetunnel".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Fixed timestep used while recording (seconds)
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Captured microphone input path
    pub fn audio_path(&self) -> String {
        format!("{}/input.wav", self.output_dir)
    }

    pub fn frame_path(&self, frame_num: usize) -> String {
        format!("{}/frame_{:05}.png", self.frames_dir(), frame_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frame_count_rounds_up() {
        let config = RecordingConfig::new(1.01);
        assert_eq!(config.total_frames(), 61);
    }

    #[test]
    fn test_recording_paths() {
        let config = RecordingConfig::new(2.0);
        assert_eq!(config.frame_path(7), "recording/frames/frame_00007.png");
        assert_eq!(config.audio_path(), "recording/input.wav");
    }

    #[test]
    fn test_aspect_ratio_guards_zero_height() {
        let config = RenderConfig {
            window_height: 0,
            ..Default::default()
        };
        assert!(config.aspect_ratio().is_finite());
    }
}

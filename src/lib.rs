//! Vibetunnel library - audio-reactive 3D particle tunnel

pub mod audio;
pub mod camera;
pub mod cli;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod tunnel;

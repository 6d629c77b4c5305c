//! Input device capture into a fixed-size mono sample ring.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use parking_lot::Mutex;
use thiserror::Error;

/// Why the input device could not be opened
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device found")]
    NoDevice,
    #[error("no input device matching '{0}'")]
    NoMatchingDevice(String),
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),
    #[error("input device unavailable")]
    Unavailable,
    #[error("failed to query input config: {0}")]
    Config(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to start input stream: {0}")]
    Stream(String),
    #[error("failed to create recording: {0}")]
    Recording(#[from] hound::Error),
}

/// Anything that can hand out the most recent mono samples
pub trait SampleSource {
    /// Fill `out` with the newest samples in chronological order,
    /// zero-padding the front when fewer have been captured
    fn read_latest(&self, out: &mut [f32]);

    fn sample_rate(&self) -> u32;

    /// Human-readable device description
    fn name(&self) -> &str;
}

/// Fixed-capacity circular sample store
#[derive(Debug)]
pub struct SampleRing {
    buf: Vec<f32>,
    write: usize,
    filled: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity.max(1)],
            write: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.buf[self.write] = sample;
        self.write = (self.write + 1) % self.buf.len();
        self.filled = (self.filled + 1).min(self.buf.len());
    }

    pub fn copy_latest(&self, out: &mut [f32]) {
        let available = self.filled.min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);

        let cap = self.buf.len();
        let start = (self.write + cap - available) % cap;
        for (i, slot) in out[pad..].iter_mut().enumerate() {
            *slot = self.buf[(start + i) % cap];
        }
    }
}

/// WAV writer for the captured input
pub struct WavRecorder {
    writer: hound::WavWriter<BufWriter<File>>,
    failed: bool,
}

impl WavRecorder {
    pub fn create(path: &str, sample_rate: u32) -> Result<Self, CaptureError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        Ok(Self {
            writer: hound::WavWriter::create(path, spec)?,
            failed: false,
        })
    }

    /// Append one sample; the first failure is logged, later ones are dropped
    fn write(&mut self, sample: f32) {
        if self.failed {
            return;
        }
        if let Err(e) = self.writer.write_sample(sample) {
            log::warn!("Audio recording stopped: {}", e);
            self.failed = true;
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

/// Live microphone capture via cpal
pub struct CpalCapture {
    ring: Arc<Mutex<SampleRing>>,
    sample_rate: u32,
    name: String,

    /// Input stream (kept alive)
    _stream: cpal::Stream,
}

impl CpalCapture {
    /// Open the default input device (or the first whose name contains
    /// `device_query`) and start streaming into the ring
    pub fn open(
        ring_capacity: usize,
        device_query: Option<&str>,
        record_path: Option<&str>,
    ) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let recorder = record_path
            .map(|path| WavRecorder::create(path, sample_rate))
            .transpose()?
            .map(|r| Arc::new(Mutex::new(r)));

        let ring = Arc::new(Mutex::new(SampleRing::new(ring_capacity)));

        let err_fn = |err| log::error!("Audio input stream error: {}", err);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let (ring, recorder) = (Arc::clone(&ring), recorder.clone());
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        push_interleaved(data, channels, &ring, recorder.as_deref())
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let (ring, recorder) = (Arc::clone(&ring), recorder.clone());
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        push_interleaved(data, channels, &ring, recorder.as_deref())
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let (ring, recorder) = (Arc::clone(&ring), recorder.clone());
                device.build_input_stream(
                    &config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        push_interleaved(data, channels, &ring, recorder.as_deref())
                    },
                    err_fn,
                    None,
                )
            }
            other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        }
        .map_err(map_build_error)?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        log::info!("Audio input: {} @ {}Hz, {} channel(s)", name, sample_rate, channels);

        Ok(Self {
            ring,
            sample_rate,
            name,
            _stream: stream,
        })
    }
}

impl SampleSource for CpalCapture {
    fn read_latest(&self, out: &mut [f32]) {
        self.ring.lock().copy_latest(out);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> Result<cpal::Device, CaptureError> {
    if let Some(query) = device_query {
        let want = query.to_lowercase();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        for device in devices {
            let matches = device
                .name()
                .map(|n| n.to_lowercase().contains(&want))
                .unwrap_or(false);
            if matches {
                return Ok(device);
            }
        }
        return Err(CaptureError::NoMatchingDevice(query.to_string()));
    }

    host.default_input_device().ok_or(CaptureError::NoDevice)
}

fn map_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::Unavailable,
        other => {
            let message = other.to_string();
            let lower = message.to_lowercase();
            if lower.contains("permission") || lower.contains("denied") {
                CaptureError::PermissionDenied(message)
            } else {
                CaptureError::Stream(message)
            }
        }
    }
}

/// Downmix interleaved frames to mono and append them to the ring
fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    ring: &Mutex<SampleRing>,
    recorder: Option<&Mutex<WavRecorder>>,
) {
    let channels = channels.max(1);
    let mut ring = ring.lock();
    let mut recorder = recorder.map(|r| r.lock());

    for frame in data.chunks(channels) {
        let sum: f32 = frame.iter().map(|s| s.to_float_sample()).sum();
        let mono = sum / frame.len() as f32;
        ring.push(mono);
        if let Some(ref mut writer) = recorder {
            writer.write(mono);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_zero_pads_until_filled() {
        let mut ring = SampleRing::new(8);
        ring.push(1.0);
        ring.push(2.0);

        let mut out = [9.0; 4];
        ring.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ring_keeps_newest_in_order_after_wrap() {
        let mut ring = SampleRing::new(4);
        for i in 0..10 {
            ring.push(i as f32);
        }

        let mut out = [0.0; 4];
        ring.copy_latest(&mut out);
        assert_eq!(out, [6.0, 7.0, 8.0, 9.0]);

        let mut short = [0.0; 2];
        ring.copy_latest(&mut short);
        assert_eq!(short, [8.0, 9.0]);
    }

    #[test]
    fn test_push_interleaved_downmixes() {
        let ring = Mutex::new(SampleRing::new(4));
        push_interleaved(&[1.0f32, 0.0, 0.5, 0.5], 2, &ring, None);

        let mut out = [0.0; 2];
        ring.lock().copy_latest(&mut out);
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn test_recorder_writes_then_stops_after_failure() {
        let path = std::env::temp_dir().join(format!("vibetunnel-{}.wav", std::process::id()));
        let mut recorder = WavRecorder::create(path.to_str().unwrap(), 48_000).unwrap();
        recorder.write(0.25);
        assert!(!recorder.has_failed());

        // State after a write error
        recorder.failed = true;
        recorder.write(0.5);
        assert!(recorder.has_failed());

        drop(recorder);
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_push_interleaved_converts_integer_samples() {
        let ring = Mutex::new(SampleRing::new(2));
        push_interleaved(&[0i16, i16::MIN], 1, &ring, None);

        let mut out = [1.0; 2];
        ring.lock().copy_latest(&mut out);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], -1.0);
    }
}

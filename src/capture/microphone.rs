//! cpal-backed microphone capture.
//!
//! Captures from the configured input device at its native sample rate,
//! downmixes to mono and keeps the samples in memory until the answer is
//! finished. The WAV encoding happens on `stop()`.

use super::{AudioCaptureDevice, AudioClip, CaptureError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Records a single answer at a time from a microphone.
pub struct MicrophoneRecorder {
    /// Device name, numeric index or "default"
    device_name: String,
    /// Rate asked for in the config
    requested_sample_rate: u32,
    /// Rate the device actually delivers
    sample_rate: u32,
    /// Mono samples of the current recording, in arrival order
    samples: Arc<Mutex<Vec<i16>>>,
    /// Open input stream; dropping it releases the device
    stream: Option<cpal::Stream>,
}

impl MicrophoneRecorder {
    pub fn new(device_name: String, requested_sample_rate: u32) -> Self {
        Self {
            device_name,
            requested_sample_rate,
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        }
    }

    fn open_device(&self) -> Result<cpal::Device, CaptureError> {
        suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or(CaptureError::DeviceUnavailable)
            } else {
                find_device(&host, &self.device_name)
            }
        })
    }

    fn build_stream(
        &self,
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
    ) -> Result<cpal::Stream, CaptureError> {
        let channels = config.channels() as usize;
        let buffer = Arc::clone(&self.samples);
        let stream_config: cpal::StreamConfig = config.clone().into();
        let on_error = |err: cpal::StreamError| tracing::error!("Audio stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    append_mono(&buffer, data, channels);
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                    append_mono(&buffer, &converted, channels);
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::Configuration(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };

        stream.map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            cpal::BuildStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
            other => CaptureError::Configuration(other.to_string()),
        })
    }
}

impl AudioCaptureDevice for MicrophoneRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        let device = self.open_device()?;
        let device_label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_label);

        let config = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            cpal::DefaultStreamConfigError::BackendSpecific { err } => {
                classify_backend_error(&err.description)
            }
            other => CaptureError::Configuration(other.to_string()),
        })?;

        let device_rate = config.sample_rate().0;
        if device_rate != self.requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.requested_sample_rate,
                device_rate
            );
        }
        self.sample_rate = device_rate;

        // Fresh buffer per answer, so a late callback from an old stream cannot leak in.
        self.samples = Arc::new(Mutex::new(Vec::new()));

        let stream = self.build_stream(&device, &config)?;
        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            cpal::PlayStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
            #[allow(unreachable_patterns)]
            other => CaptureError::Configuration(other.to_string()),
        })?;
        self.stream = Some(stream);

        tracing::debug!(
            "Audio stream started: {}Hz, {} channels",
            device_rate,
            config.channels()
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        let Some(stream) = self.stream.take() else {
            return Err(CaptureError::NotRecording);
        };
        drop(stream);

        let samples = std::mem::take(
            &mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner),
        );
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            samples.len() as f32 / self.sample_rate.max(1) as f32,
            samples.len(),
            self.sample_rate
        );

        AudioClip::from_samples(&samples, self.sample_rate)
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    fn recent_samples(&self, max: usize) -> Vec<i16> {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let start = samples.len().saturating_sub(max);
        samples[start..].to_vec()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for MicrophoneRecorder {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Released microphone on drop");
        }
    }
}

/// Appends interleaved samples to the buffer, averaging channels into mono.
fn append_mono(buffer: &Mutex<Vec<i16>>, data: &[i16], channels: usize) {
    let mut samples = buffer.lock().unwrap_or_else(PoisonError::into_inner);
    if channels <= 1 {
        samples.extend_from_slice(data);
        return;
    }
    samples.extend(data.chunks_exact(channels).map(|frame| {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        (sum / channels as i32) as i16
    }));
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Maps a backend-specific cpal error onto the capture error taxonomy.
fn classify_backend_error(description: &str) -> CaptureError {
    let lower = description.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied
    } else if lower.contains("no such device") || lower.contains("not available") {
        CaptureError::DeviceUnavailable
    } else {
        CaptureError::Configuration(description.to_string())
    }
}

/// Finds an input device by numeric index or exact name.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| CaptureError::Configuration(format!("Failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices.into_iter().nth(index).ok_or_else(|| {
            tracing::warn!("Device index {} is out of range", index);
            CaptureError::DeviceUnavailable
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            tracing::warn!("Audio input device '{}' not found", device_spec);
            CaptureError::DeviceUnavailable
        })
}

/// Runs `f` with stderr redirected to /dev/null to hide ALSA's probing noise.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let Ok(dev_null) = OpenOptions::new().write(true).open("/dev/null") else {
        return f();
    };

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_are_averaged() {
        let buffer = Mutex::new(Vec::new());
        append_mono(&buffer, &[100, 300, -50, 50, 7], 2);
        assert_eq!(*buffer.lock().unwrap(), vec![200, 0]);
    }

    #[test]
    fn mono_frames_keep_arrival_order() {
        let buffer = Mutex::new(Vec::new());
        append_mono(&buffer, &[1, 2], 1);
        append_mono(&buffer, &[3], 1);
        assert_eq!(*buffer.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn float_samples_are_clamped() {
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(-2.0), -i16::MAX);
    }

    #[test]
    fn backend_errors_are_classified() {
        assert_eq!(
            classify_backend_error("Permission denied by user"),
            CaptureError::PermissionDenied
        );
        assert_eq!(
            classify_backend_error("ALSA: No such device"),
            CaptureError::DeviceUnavailable
        );
        assert!(matches!(
            classify_backend_error("buffer size unsupported"),
            CaptureError::Configuration(_)
        ));
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let mut recorder = MicrophoneRecorder::new("default".into(), 16000);
        assert_eq!(recorder.stop(), Err(CaptureError::NotRecording));
        assert!(!recorder.is_active());
    }
}

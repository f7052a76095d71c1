//! Microphone capture behind a small capability trait.
//!
//! The interview controller only talks to [`AudioCaptureDevice`], so the real
//! cpal-backed [`MicrophoneRecorder`] can be swapped for a scripted device in
//! tests.

pub mod microphone;

pub use microphone::MicrophoneRecorder;

use std::fmt;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while capturing an answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("no audio input device available")]
    DeviceUnavailable,

    #[error("audio device configuration failed: {0}")]
    Configuration(String),

    #[error("not recording")]
    NotRecording,

    #[error("recording contained no audio")]
    EmptyRecording,

    #[error("audio encoding failed: {0}")]
    Encoding(String),
}

impl CaptureError {
    /// Message shown to the candidate in the transcript.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Could not access your microphone. Please allow microphone access and try again."
                    .to_string()
            }
            Self::DeviceUnavailable => {
                "No microphone was found. Connect one (see `viva list-devices`) and try again."
                    .to_string()
            }
            Self::EmptyRecording => {
                "Nothing was recorded. Please record your answer again.".to_string()
            }
            other => format!("Recording failed: {other}. Please try again."),
        }
    }
}

/// A finished, immutable recording encoded as 16-bit mono WAV.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    wav: Vec<u8>,
    sample_rate: u32,
    sample_count: usize,
}

impl AudioClip {
    /// File name used when the clip is uploaded.
    pub const FILE_NAME: &'static str = "audio.wav";

    /// MIME type of the encoded clip.
    pub const MIME_TYPE: &'static str = "audio/wav";

    /// Encodes mono PCM samples into a WAV clip.
    ///
    /// # Errors
    /// - `EmptyRecording` if there are no samples
    /// - `Encoding` if the WAV writer fails
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Result<Self, CaptureError> {
        if samples.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| CaptureError::Encoding(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        }

        Ok(Self {
            wav: cursor.into_inner(),
            sample_rate,
            sample_count: samples.len(),
        })
    }

    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.sample_count as f64 / self.sample_rate.max(1) as f64)
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.wav.len())
            .field("sample_rate", &self.sample_rate)
            .field("duration", &self.duration())
            .finish()
    }
}

/// Capability to record one utterance at a time.
///
/// Callers must not call `start` while active or `stop` while idle; the
/// interview controller's state machine guarantees this.
pub trait AudioCaptureDevice {
    /// Opens the input device and begins buffering audio.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Releases the device and returns the buffered audio as a clip.
    ///
    /// The device must be released even when an error is returned.
    fn stop(&mut self) -> Result<AudioClip, CaptureError>;

    /// Whether a capture is in progress.
    fn is_active(&self) -> bool;

    /// Up to `max` of the most recently captured samples, for level metering.
    fn recent_samples(&self, max: usize) -> Vec<i16>;

    /// Sample rate of the current or last capture.
    fn sample_rate(&self) -> u32;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted capture device for controller tests.

    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    pub struct FakeDevice {
        pub start_failures: VecDeque<CaptureError>,
        pub stop_failures: VecDeque<CaptureError>,
        pub active: bool,
        pub starts: usize,
        pub stops: usize,
    }

    impl FakeDevice {
        pub fn denying() -> Self {
            Self {
                start_failures: VecDeque::from([CaptureError::PermissionDenied]),
                ..Self::default()
            }
        }
    }

    impl AudioCaptureDevice for FakeDevice {
        fn start(&mut self) -> Result<(), CaptureError> {
            assert!(!self.active, "start() called while already recording");
            if let Some(err) = self.start_failures.pop_front() {
                return Err(err);
            }
            self.active = true;
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<AudioClip, CaptureError> {
            assert!(self.active, "stop() called while not recording");
            self.active = false;
            self.stops += 1;
            if let Some(err) = self.stop_failures.pop_front() {
                return Err(err);
            }
            AudioClip::from_samples(&[0, 120, -120, 64], 16000)
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn recent_samples(&self, _max: usize) -> Vec<i16> {
            Vec::new()
        }

        fn sample_rate(&self) -> u32 {
            16000
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_encodes_wav_header_and_duration() {
        let samples = vec![0i16; 8000];
        let clip = AudioClip::from_samples(&samples, 16000).unwrap();

        assert_eq!(&clip.wav_bytes()[..4], b"RIFF");
        assert_eq!(&clip.wav_bytes()[8..12], b"WAVE");
        assert_eq!(clip.wav_bytes().len(), 44 + samples.len() * 2);
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }

    #[test]
    fn clip_decodes_back_to_same_samples() {
        let samples = vec![1i16, -2, 300, -32768, 32767];
        let clip = AudioClip::from_samples(&samples, 8000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(clip.wav_bytes().to_vec())).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn empty_samples_are_rejected() {
        assert_eq!(
            AudioClip::from_samples(&[], 16000),
            Err(CaptureError::EmptyRecording)
        );
    }

    #[test]
    fn permission_errors_have_readable_messages() {
        assert!(CaptureError::PermissionDenied
            .user_message()
            .contains("allow microphone access"));
        assert!(CaptureError::Configuration("bad rate".into())
            .user_message()
            .contains("bad rate"));
    }
}

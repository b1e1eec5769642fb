use std::time::{Duration, Instant};

use parla_domain::AudioPayload;
use tracing::{debug, info, warn};

use crate::backend::{InputStream, MicrophoneBackend, StreamConfig};
use crate::dsp::{normalize_buffer, PeakLevel};
use crate::encoder::package_chunks;
use crate::error::CaptureError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Owns an open input stream and releases it when dropped, whatever path leaves `recording`.
struct StreamGuard {
    stream: Box<dyn InputStream>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.release();
    }
}

struct ActiveRecording {
    guard: StreamGuard,
    chunks: Vec<Vec<f32>>,
    started_at: Instant,
    deadline: Option<Instant>,
    peak: PeakLevel,
}

impl ActiveRecording {
    fn pull(&mut self) -> Result<(), CaptureError> {
        for chunk in self.guard.stream.read_chunks()? {
            self.peak.observe(&chunk);
            self.chunks.push(chunk);
        }
        Ok(())
    }
}

/// Drives one microphone through `idle -> recording -> packaged payload`.
///
/// At most one recording is active per controller. The forced-stop deadline lives inside the
/// active recording, so it disappears with it and cannot fire against a later recording.
pub struct CaptureController<B: MicrophoneBackend> {
    backend: B,
    config: StreamConfig,
    active: Option<ActiveRecording>,
}

impl<B: MicrophoneBackend> CaptureController<B> {
    pub fn new(backend: B, config: StreamConfig) -> Self {
        Self {
            backend,
            config,
            active: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> CaptureState {
        if self.active.is_some() {
            CaptureState::Recording
        } else {
            CaptureState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Peak input amplitude of the current recording, for a level meter.
    pub fn level(&self) -> f32 {
        self.active
            .as_ref()
            .map(|active| active.peak.amplitude())
            .unwrap_or(0.0)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.active
            .as_ref()
            .map(|active| now.saturating_duration_since(active.started_at))
            .unwrap_or_default()
    }

    /// Opens the microphone. `timeout` forces a stop once that much time has passed.
    pub fn start(&mut self, now: Instant, timeout: Option<Duration>) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        let stream = self.backend.open_input(&self.config).map_err(|err| {
            warn!(%err, "microphone acquisition failed");
            match err {
                CaptureError::DeviceLost(reason) => CaptureError::Unavailable(reason),
                other => other,
            }
        })?;
        info!(?timeout, "recording started");
        self.active = Some(ActiveRecording {
            guard: StreamGuard { stream },
            chunks: Vec::new(),
            started_at: now,
            deadline: timeout.map(|t| now + t),
            peak: PeakLevel::silence(),
        });
        Ok(())
    }

    /// Buffers newly arrived audio. Returns the packaged payload once the forced-stop deadline
    /// passes. A lost device ends the recording, releases the stream and returns to idle.
    pub fn poll(&mut self, now: Instant) -> Result<Option<AudioPayload>, CaptureError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let deadline = active.deadline;
        if let Err(err) = active.pull() {
            warn!(%err, "input stream failed; discarding recording");
            self.active = None;
            return Err(err);
        }
        match deadline {
            Some(deadline) if now >= deadline => {
                debug!("recording timeout reached");
                self.stop().map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Stops recording and packages every buffered chunk. The stream is released before
    /// packaging, so it is released even when packaging fails.
    pub fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        let mut active = self.active.take().ok_or(CaptureError::NotRecording)?;
        if let Err(err) = active.pull() {
            warn!(%err, "final read failed; packaging what was captured");
        }
        let sample_rate = active.guard.stream.sample_rate();
        let ActiveRecording { guard, mut chunks, .. } = active;
        drop(guard);

        if let Some(target) = self.config.normalize_to {
            // gain is computed over the whole recording, not per chunk
            let mut samples = chunks.concat();
            normalize_buffer(&mut samples, target);
            chunks = vec![samples];
        }
        let payload = package_chunks(&chunks, sample_rate)?;
        info!(
            bytes = payload.bytes.len(),
            duration_ms = payload.duration.as_millis() as u64,
            "recording packaged"
        );
        Ok(payload)
    }

    /// Discards the current recording, if any.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            debug!("recording cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;

    fn controller(backend: ScriptedBackend) -> CaptureController<ScriptedBackend> {
        CaptureController::new(
            backend,
            StreamConfig {
                sample_rate: 8_000,
                normalize_to: None,
            },
        )
    }

    #[test]
    fn records_and_packages_in_arrival_order() {
        let backend = ScriptedBackend::new().with_chunks([vec![0.1; 4_000]]);
        let mut capture = controller(backend.clone());
        let now = Instant::now();
        capture.start(now, None).unwrap();
        assert_eq!(capture.state(), CaptureState::Recording);
        assert_eq!(capture.poll(now).unwrap(), None);
        backend.push_chunk(vec![0.2; 4_000]);
        let payload = capture.stop().unwrap();
        assert_eq!(payload.duration, Duration::from_secs(1));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(backend.release_count(), 1);
    }

    #[test]
    fn denied_microphone_stays_idle() {
        let mut capture = controller(ScriptedBackend::denied("permission denied"));
        let err = capture.start(Instant::now(), None).unwrap_err();
        assert!(matches!(err, CaptureError::Unavailable(_)));
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn second_start_is_rejected() {
        let backend = ScriptedBackend::new();
        let mut capture = controller(backend.clone());
        let now = Instant::now();
        capture.start(now, None).unwrap();
        assert_eq!(capture.start(now, None), Err(CaptureError::AlreadyRecording));
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn timeout_forces_stop() {
        let backend = ScriptedBackend::new().with_chunks([vec![0.3; 800]]);
        let mut capture = controller(backend.clone());
        let now = Instant::now();
        capture.start(now, Some(Duration::from_secs(3))).unwrap();
        assert_eq!(capture.poll(now + Duration::from_secs(1)).unwrap(), None);
        let payload = capture
            .poll(now + Duration::from_secs(3))
            .unwrap()
            .expect("deadline should stop the recording");
        assert_eq!(payload.sample_rate, 8_000);
        assert!(!capture.is_recording());
        assert_eq!(backend.release_count(), 1);
    }

    #[test]
    fn payload_carries_the_stream_rate_not_the_requested_one() {
        let backend = ScriptedBackend::new()
            .with_native_rate(44_100)
            .with_chunks([vec![0.2; 441]]);
        let mut capture = controller(backend);
        capture.start(Instant::now(), None).unwrap();
        let payload = capture.stop().unwrap();
        assert_eq!(payload.sample_rate, 44_100);
        let reader = hound::WavReader::new(std::io::Cursor::new(payload.bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 44_100);
    }

    #[test]
    fn device_loss_releases_and_clears_deadline() {
        let backend = ScriptedBackend::new()
            .with_chunks([vec![0.3; 800]])
            .fail_after_reads(1);
        let mut capture = controller(backend.clone());
        let now = Instant::now();
        capture.start(now, Some(Duration::from_secs(3))).unwrap();
        assert_eq!(capture.poll(now).unwrap(), None);
        let err = capture.poll(now + Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err, CaptureError::DeviceLost(_)));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(backend.release_count(), 1);
        // the old deadline is gone with the recording
        assert_eq!(capture.poll(now + Duration::from_secs(10)).unwrap(), None);
        // controls are usable again
        capture.start(now + Duration::from_secs(11), None).unwrap();
        assert_eq!(backend.open_count(), 2);
    }

    #[test]
    fn release_runs_when_packaging_fails() {
        let backend = ScriptedBackend::new();
        let mut capture = controller(backend.clone());
        capture.start(Instant::now(), None).unwrap();
        assert_eq!(capture.stop(), Err(CaptureError::EmptyRecording));
        assert_eq!(backend.release_count(), 1);
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn stop_without_recording_is_an_error() {
        let mut capture = controller(ScriptedBackend::new());
        assert_eq!(capture.stop(), Err(CaptureError::NotRecording));
    }

    #[test]
    fn level_tracks_peak_while_recording() {
        let backend = ScriptedBackend::new().with_chunks([vec![0.1, -0.6, 0.2]]);
        let mut capture = controller(backend);
        let now = Instant::now();
        capture.start(now, None).unwrap();
        capture.poll(now).unwrap();
        assert!((capture.level() - 0.6).abs() < 1e-6);
        capture.cancel();
        assert_eq!(capture.level(), 0.0);
    }
}

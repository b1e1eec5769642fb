use std::time::{Duration, Instant};

use parla_audio::{CaptureController, CaptureError, MicrophoneBackend, StreamConfig};
use parla_domain::{AssessmentService, AudioPayload, PracticeError, PronunciationResult};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::PracticeConfig;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Stopped,
    Analyzing,
    Resulted,
    Failed,
}

/// One guided attempt at a word: the recording, its assessment and the last failure.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingSession {
    pub state: RecordingState,
    pub target_word: Option<String>,
    pub payload: Option<AudioPayload>,
    pub result: Option<PronunciationResult>,
    pub error: Option<PracticeError>,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self {
            state: RecordingState::Idle,
            target_word: None,
            payload: None,
            result: None,
            error: None,
        }
    }
}

impl RecordingSession {
    /// Whether the host should enable the record control.
    pub fn can_record(&self) -> bool {
        !matches!(
            self.state,
            RecordingState::Recording | RecordingState::Analyzing
        )
    }
}

/// A stopped recording handed out for assessment.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingAssessment {
    pub payload: AudioPayload,
    pub word: String,
}

/// Record, stop, assess. Wraps a [`CaptureController`] with the guided-attempt lifecycle and the
/// forced-stop timeout.
pub struct PronunciationFlow<B: MicrophoneBackend> {
    capture: CaptureController<B>,
    timeout: Duration,
    session: RecordingSession,
}

impl<B: MicrophoneBackend> PronunciationFlow<B> {
    pub fn new(backend: B, stream: StreamConfig, config: &PracticeConfig) -> Self {
        Self {
            capture: CaptureController::new(backend, stream),
            timeout: config.recording_timeout(),
            session: RecordingSession::default(),
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn state(&self) -> RecordingState {
        self.session.state
    }

    pub fn result(&self) -> Option<&PronunciationResult> {
        self.session.result.as_ref()
    }

    pub fn capture(&self) -> &CaptureController<B> {
        &self.capture
    }

    pub fn level(&self) -> f32 {
        self.capture.level()
    }

    #[instrument(skip(self, now))]
    pub fn start(&mut self, word: &str, now: Instant) -> Result<(), PracticeError> {
        match self.session.state {
            RecordingState::Recording => {
                return Err(PracticeError::validation("a recording is already in progress"))
            }
            RecordingState::Analyzing => {
                return Err(PracticeError::validation("an assessment is still pending"))
            }
            _ => {}
        }
        self.session = RecordingSession {
            target_word: Some(word.to_string()),
            ..RecordingSession::default()
        };
        if let Err(err) = self.capture.start(now, Some(self.timeout)) {
            let err = PracticeError::from(err);
            self.session.error = Some(err.clone());
            return Err(err);
        }
        self.session.state = RecordingState::Recording;
        Ok(())
    }

    /// Drains buffered audio and applies the forced stop. Returns `true` once the recording has
    /// stopped on its own.
    pub fn poll(&mut self, now: Instant) -> Result<bool, PracticeError> {
        if self.session.state != RecordingState::Recording {
            return Ok(false);
        }
        match self.capture.poll(now) {
            Ok(Some(payload)) => {
                self.stopped(payload);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => Err(self.capture_failed(err, RecordingState::Idle)),
        }
    }

    pub fn stop(&mut self) -> Result<(), PracticeError> {
        if self.session.state != RecordingState::Recording {
            return Err(PracticeError::validation("no recording in progress"));
        }
        match self.capture.stop() {
            Ok(payload) => {
                self.stopped(payload);
                Ok(())
            }
            Err(err) => Err(self.capture_failed(err, RecordingState::Failed)),
        }
    }

    /// Abandons the current recording without packaging it.
    pub fn cancel(&mut self) {
        if self.session.state == RecordingState::Recording {
            self.capture.cancel();
            self.session.state = RecordingState::Idle;
        }
    }

    /// Moves a stopped recording to `analyzing` and hands it out. Hosts that run the request on
    /// their own executor call this, then [`Self::finish_assessment`].
    pub fn begin_assessment(&mut self) -> Result<PendingAssessment, PracticeError> {
        if self.session.state != RecordingState::Stopped {
            return Err(PracticeError::validation("no stopped recording to assess"));
        }
        let (Some(payload), Some(word)) = (
            self.session.payload.clone(),
            self.session.target_word.clone(),
        ) else {
            return Err(PracticeError::validation("no stopped recording to assess"));
        };
        self.session.state = RecordingState::Analyzing;
        Ok(PendingAssessment { payload, word })
    }

    pub fn finish_assessment(
        &mut self,
        outcome: Result<PronunciationResult, PracticeError>,
    ) -> Result<&PronunciationResult, PracticeError> {
        if self.session.state != RecordingState::Analyzing {
            return Err(PracticeError::validation("no assessment is pending"));
        }
        match outcome {
            Ok(result) => {
                info!(overall = ?result.scores.overall, "assessment received");
                self.session.state = RecordingState::Resulted;
                let result = self.session.result.insert(result);
                Ok(&*result)
            }
            Err(err) => {
                let err = match err {
                    PracticeError::AssessmentFailed(_) => err,
                    other => PracticeError::assessment_failed(other.to_string()),
                };
                warn!(%err, "assessment failed");
                self.session.state = RecordingState::Failed;
                self.session.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Submits the stopped recording and waits for the verdict.
    pub async fn submit(
        &mut self,
        service: &dyn AssessmentService,
    ) -> Result<&PronunciationResult, PracticeError> {
        let pending = self.begin_assessment()?;
        let outcome = service.assess(&pending.payload, &pending.word).await;
        self.finish_assessment(outcome)
    }

    /// Returns to `idle` after a result or failure, keeping the target word for another attempt.
    pub fn retry(&mut self) -> bool {
        if !matches!(
            self.session.state,
            RecordingState::Failed | RecordingState::Resulted | RecordingState::Stopped
        ) {
            return false;
        }
        self.session = RecordingSession {
            target_word: self.session.target_word.take(),
            ..RecordingSession::default()
        };
        true
    }

    fn stopped(&mut self, payload: AudioPayload) {
        self.session.payload = Some(payload);
        self.session.state = RecordingState::Stopped;
    }

    fn capture_failed(&mut self, err: CaptureError, state: RecordingState) -> PracticeError {
        let err = PracticeError::from(err);
        warn!(%err, ?state, "recording ended without a payload");
        self.session.state = state;
        self.session.error = Some(err.clone());
        err
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PracticeError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Microphone permission denied or no input device. The user may retry.
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(String),
    /// Transport or decoding failure while scoring a recording. Retry re-enters idle.
    #[error("pronunciation assessment failed: {0}")]
    AssessmentFailed(String),
    /// A collaborator could not be reached or answered with an error status.
    #[error("service unavailable: {0}")]
    Transport(String),
    #[error("no vocabulary items to practice")]
    EmptyPool,
}

impl PracticeError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub fn capture_unavailable<T: Into<String>>(message: T) -> Self {
        Self::CaptureUnavailable(message.into())
    }

    pub fn assessment_failed<T: Into<String>>(message: T) -> Self {
        Self::AssessmentFailed(message.into())
    }

    /// Failures the user can clear by trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CaptureUnavailable(_) | Self::AssessmentFailed(_) | Self::Transport(_)
        )
    }
}

use parla_domain::PracticeError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("microphone unavailable: {0}")]
    Unavailable(String),
    #[error("input device lost while recording: {0}")]
    DeviceLost(String),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
    #[error("recording contained no audio")]
    EmptyRecording,
    #[error("failed to package recording: {0}")]
    Encoding(String),
}

impl From<hound::Error> for CaptureError {
    fn from(err: hound::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<CaptureError> for PracticeError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unavailable(reason) | CaptureError::DeviceLost(reason) => {
                PracticeError::CaptureUnavailable(reason)
            }
            other => PracticeError::Validation(other.to_string()),
        }
    }
}

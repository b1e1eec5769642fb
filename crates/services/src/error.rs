use parla_domain::PracticeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<ServiceError> for PracticeError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Decode(reason) => PracticeError::Serialization(reason),
            other => PracticeError::Transport(other.to_string()),
        }
    }
}

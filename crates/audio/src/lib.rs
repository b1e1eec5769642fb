pub mod backend;
pub mod capture;
pub mod cpal_backend;
pub mod dsp;
pub mod encoder;
pub mod error;

pub use backend::{InputStream, MicrophoneBackend, ScriptedBackend, StreamConfig};
pub use capture::{CaptureController, CaptureState};
pub use cpal_backend::CpalBackend;
pub use dsp::{normalize_buffer, PeakLevel};
pub use encoder::{encode_wav, package_chunks, WAV_MEDIA_TYPE};
pub use error::CaptureError;

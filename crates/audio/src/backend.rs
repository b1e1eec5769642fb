use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CaptureError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    /// Preferred sample rate. Backends may record at the device's native rate instead; the
    /// packaged payload carries the rate actually used.
    pub sample_rate: u32,
    /// Peak amplitude recordings are normalized to before packaging; `None` keeps raw levels.
    pub normalize_to: Option<f32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            normalize_to: Some(0.9),
        }
    }
}

/// A live microphone stream. Chunks are mono `f32` samples in arrival order.
pub trait InputStream {
    fn sample_rate(&self) -> u32;
    /// Returns every chunk that arrived since the previous call.
    fn read_chunks(&mut self) -> Result<Vec<Vec<f32>>, CaptureError>;
    /// Releases the hardware handle. Must be safe to call more than once.
    fn release(&mut self);
}

pub trait MicrophoneBackend {
    fn open_input(&self, config: &StreamConfig) -> Result<Box<dyn InputStream>, CaptureError>;
}

#[derive(Debug, Default)]
struct Script {
    chunks: VecDeque<Vec<f32>>,
    deny: Option<String>,
    fail_after_reads: Option<usize>,
    native_rate: Option<u32>,
    reads: usize,
    opened: usize,
    released: usize,
}

/// Backend fed from a prepared script of chunks, for tests and headless hosts.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `open_input` fails as if permission was denied.
    pub fn denied(reason: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.lock().deny = Some(reason.into());
        backend
    }

    pub fn with_chunks(self, chunks: impl IntoIterator<Item = Vec<f32>>) -> Self {
        self.lock().chunks.extend(chunks);
        self
    }

    /// The stream reports a lost device once it has been read `reads` times.
    pub fn fail_after_reads(self, reads: usize) -> Self {
        self.lock().fail_after_reads = Some(reads);
        self
    }

    /// Streams open at this rate whatever the requested config says, like a device that
    /// cannot be reconfigured.
    pub fn with_native_rate(self, sample_rate: u32) -> Self {
        self.lock().native_rate = Some(sample_rate);
        self
    }

    pub fn push_chunk(&self, chunk: Vec<f32>) {
        self.lock().chunks.push_back(chunk);
    }

    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    pub fn release_count(&self) -> usize {
        self.lock().released
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MicrophoneBackend for ScriptedBackend {
    fn open_input(&self, config: &StreamConfig) -> Result<Box<dyn InputStream>, CaptureError> {
        let mut script = self.lock();
        if let Some(reason) = &script.deny {
            return Err(CaptureError::Unavailable(reason.clone()));
        }
        script.opened += 1;
        script.reads = 0;
        debug!(?config, "opening scripted input stream");
        Ok(Box::new(ScriptedStream {
            script: self.script.clone(),
            sample_rate: script.native_rate.unwrap_or(config.sample_rate),
            released: false,
        }))
    }
}

struct ScriptedStream {
    script: Arc<Mutex<Script>>,
    sample_rate: u32,
    released: bool,
}

impl InputStream for ScriptedStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunks(&mut self) -> Result<Vec<Vec<f32>>, CaptureError> {
        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        script.reads += 1;
        if let Some(limit) = script.fail_after_reads {
            if script.reads > limit {
                return Err(CaptureError::DeviceLost("device removed".into()));
            }
        }
        Ok(script.chunks.drain(..).collect())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        script.released += 1;
    }
}

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream};
use tracing::{debug, warn};

use crate::backend::{InputStream, MicrophoneBackend, StreamConfig};
use crate::dsp::interleaved_to_mono;
use crate::error::CaptureError;

/// Records from the host's default input device. The device's native sample rate is kept.
#[derive(Clone, Debug, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn select_device(&self) -> Result<Device, CaptureError> {
        let host = cpal::default_host();
        if let Some(name) = self.device_name.as_deref() {
            let devices = host
                .input_devices()
                .map_err(|err| CaptureError::Unavailable(err.to_string()))?;
            for device in devices {
                if device.name().map(|n| n == name).unwrap_or(false) {
                    return Ok(device);
                }
            }
            return Err(CaptureError::Unavailable(format!(
                "input device '{name}' not found"
            )));
        }
        host.default_input_device()
            .ok_or_else(|| CaptureError::Unavailable("no default input device available".into()))
    }
}

impl MicrophoneBackend for CpalBackend {
    fn open_input(&self, config: &StreamConfig) -> Result<Box<dyn InputStream>, CaptureError> {
        let device = self.select_device()?;
        let supported = device
            .default_input_config()
            .map_err(|err| CaptureError::Unavailable(err.to_string()))?;
        let stream_config = supported.config();
        let channels = stream_config.channels as usize;
        let sample_rate = stream_config.sample_rate.0;
        if sample_rate != config.sample_rate {
            debug!(
                requested = config.sample_rate,
                native = sample_rate,
                "using native input sample rate"
            );
        }

        let (sender, receiver) = mpsc::channel::<Vec<f32>>();
        let failure = Arc::new(Mutex::new(None));
        let err_fn = {
            let failure = failure.clone();
            move |err: cpal::StreamError| {
                warn!(%err, "audio input stream error");
                if let Ok(mut slot) = failure.lock() {
                    slot.get_or_insert_with(|| err.to_string());
                }
            }
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let sender = sender.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        emit(&sender, interleaved_to_mono(data, channels))
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let sender = sender.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<f32> =
                            data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                        emit(&sender, interleaved_to_mono(&converted, channels))
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let sender = sender.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<f32> = data
                            .iter()
                            .map(|&s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0)
                            .collect();
                        emit(&sender, interleaved_to_mono(&converted, channels))
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(CaptureError::Unavailable(format!(
                    "unsupported input sample format {other:?}"
                )))
            }
        }
        .map_err(|err| CaptureError::Unavailable(err.to_string()))?;

        stream
            .play()
            .map_err(|err| CaptureError::Unavailable(err.to_string()))?;
        debug!(sample_rate, channels, "input stream started");

        Ok(Box::new(CpalStream {
            stream: Some(stream),
            receiver,
            failure,
            sample_rate,
        }))
    }
}

fn emit(sender: &Sender<Vec<f32>>, chunk: Vec<f32>) {
    let _ = sender.send(chunk);
}

struct CpalStream {
    stream: Option<Stream>,
    receiver: Receiver<Vec<f32>>,
    failure: Arc<Mutex<Option<String>>>,
    sample_rate: u32,
}

impl InputStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_chunks(&mut self) -> Result<Vec<Vec<f32>>, CaptureError> {
        if let Some(reason) = self.failure.lock().ok().and_then(|slot| slot.clone()) {
            return Err(CaptureError::DeviceLost(reason));
        }
        let mut chunks = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.stream.is_some() {
                        return Err(CaptureError::DeviceLost("input stream closed".into()));
                    }
                    break;
                }
            }
        }
        Ok(chunks)
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            debug!("input stream released");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Running peak of the incoming signal, used for the recording level meter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakLevel {
    pub max: f32,
    pub min: f32,
}

impl PeakLevel {
    pub fn silence() -> Self {
        Self { max: 0.0, min: 0.0 }
    }

    pub fn observe(&mut self, chunk: &[f32]) {
        for sample in chunk {
            self.max = self.max.max(*sample);
            self.min = self.min.min(*sample);
        }
    }

    /// Absolute peak in `0.0..=1.0`.
    pub fn amplitude(&self) -> f32 {
        self.max.abs().max(self.min.abs()).min(1.0)
    }
}

impl Default for PeakLevel {
    fn default() -> Self {
        Self::silence()
    }
}

pub fn mix_to_mono(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().sum::<f32>() / frame.len() as f32
}

pub fn interleaved_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels).map(mix_to_mono).collect()
}

/// Scales the buffer so its loudest sample sits at `target` amplitude. Silent buffers are untouched.
pub fn normalize_buffer(buffer: &mut [f32], target: f32) -> PeakLevel {
    let mut peak = PeakLevel::silence();
    peak.observe(buffer);
    let amplitude = peak.max.abs().max(peak.min.abs());
    if amplitude < 1e-6 {
        return peak;
    }
    let gain = target / amplitude;
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
    peak
}

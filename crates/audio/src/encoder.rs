use std::io::Cursor;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use parla_domain::AudioPayload;

use crate::error::CaptureError;

pub const WAV_MEDIA_TYPE: &str = "audio/wav";

/// Concatenates mono chunks in arrival order into a single 16-bit PCM WAV payload.
pub fn package_chunks(chunks: &[Vec<f32>], sample_rate: u32) -> Result<AudioPayload, CaptureError> {
    let total: usize = chunks.iter().map(Vec::len).sum();
    if total == 0 {
        return Err(CaptureError::EmptyRecording);
    }
    if sample_rate == 0 {
        return Err(CaptureError::Encoding("sample rate must be positive".into()));
    }
    let mut samples = Vec::with_capacity(total);
    for chunk in chunks {
        samples.extend_from_slice(chunk);
    }
    encode_wav(&samples, sample_rate)
}

pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<AudioPayload, CaptureError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
    Ok(AudioPayload::new(
        cursor.into_inner(),
        WAV_MEDIA_TYPE,
        sample_rate,
        duration,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packages_chunks_in_order() {
        let chunks = vec![vec![0.5; 8_000], vec![-0.5; 8_000]];
        let payload = package_chunks(&chunks, 16_000).unwrap();
        assert_eq!(payload.media_type, WAV_MEDIA_TYPE);
        assert_eq!(payload.duration, Duration::from_secs(1));
        assert_eq!(&payload.bytes[..4], b"RIFF");

        let mut reader = hound::WavReader::new(Cursor::new(payload.bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 16_000);
        assert!(decoded[0] > 0);
        assert!(decoded[15_999] < 0);
    }

    #[test]
    fn empty_recordings_are_rejected() {
        assert_eq!(
            package_chunks(&[vec![], vec![]], 16_000),
            Err(CaptureError::EmptyRecording)
        );
    }

    #[test]
    fn zero_sample_rate_is_an_encoding_error() {
        assert!(matches!(
            package_chunks(&[vec![0.1]], 0),
            Err(CaptureError::Encoding(_))
        ));
    }
}

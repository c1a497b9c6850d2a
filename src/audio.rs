//! WAV loading and peak normalization.
//!
//! Decodes an entire clip into a mono f32 waveform. Uploads are decoded
//! straight from their in-memory buffer; nothing is spooled to disk.

use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::error::ClassifyError;

/// A fully decoded mono waveform
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    /// Clip duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Peak-normalize the waveform in place so the maximum absolute
    /// amplitude is 1.0.
    ///
    /// A silent buffer (peak 0) is left unchanged rather than divided
    /// through by zero; that would flood the rest of the pipeline with NaN.
    pub fn peak_normalize(&mut self) {
        let peak = self
            .samples
            .iter()
            .fold(0.0f32, |acc, &s| acc.max(s.abs()));

        if peak == 0.0 {
            warn!("Silent clip: peak amplitude is zero, skipping normalization");
            return;
        }

        for s in self.samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// Load a WAV file from disk into a mono waveform.
///
/// The existence check runs before the decoder so a missing file is
/// reported distinctly from a corrupt one.
pub fn load_wav(path: &Path) -> Result<Waveform, ClassifyError> {
    if !path.exists() {
        return Err(ClassifyError::FileNotFound(path.to_path_buf()));
    }

    let reader = hound::WavReader::open(path)
        .map_err(|e| ClassifyError::AudioUnreadable(e.to_string()))?;
    decode_reader(reader)
}

/// Decode a WAV container held in memory (the upload path).
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform, ClassifyError> {
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes))
        .map_err(|e| ClassifyError::AudioUnreadable(e.to_string()))?;
    decode_reader(reader)
}

fn decode_reader<R: Read>(mut reader: hound::WavReader<R>) -> Result<Waveform, ClassifyError> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(ClassifyError::AudioUnreadable(
            "container declares zero channels".to_string(),
        ));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| ClassifyError::AudioUnreadable(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| ClassifyError::AudioUnreadable(e.to_string()))?
        }
    };

    if interleaved.is_empty() {
        return Err(ClassifyError::AudioUnreadable(
            "container holds no samples".to_string(),
        ));
    }
    if interleaved.iter().any(|s| !s.is_finite()) {
        return Err(ClassifyError::AudioUnreadable(
            "container holds non-finite samples".to_string(),
        ));
    }

    let samples = downmix(&interleaved, spec.channels as usize);

    Ok(Waveform {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Downmix interleaved multi-channel samples to mono by channel averaging
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

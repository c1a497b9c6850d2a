//! MFCC computation over a whole clip.
//!
//! Output is a (coefficients x frames) matrix; the row count is fixed by
//! configuration and the column count follows the clip duration.

use std::f32::consts::PI;
use std::sync::Arc;

use ndarray::Array2;
use realfft::{RealFftPlanner, RealToComplex};

use crate::config::MfccConfig;
use crate::error::ClassifyError;

/// MFCC extractor with pre-computed filterbank, window and FFT plan
pub struct MfccExtractor {
    config: MfccConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    mel_filterbank: Vec<Vec<f32>>,
    window: Vec<f32>,
    // Pre-allocated buffers
    fft_input: Vec<f32>,
    fft_output: Vec<realfft::num_complex::Complex<f32>>,
}

impl MfccExtractor {
    /// Create a new extractor for clips at the given sample rate
    pub fn new(sample_rate: u32, config: MfccConfig) -> Self {
        // Hann window over the full FFT length
        let window: Vec<f32> = (0..config.n_fft)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (config.n_fft - 1) as f32).cos()))
            .collect();

        let fmax = config.fmax.unwrap_or(sample_rate as f32 / 2.0);
        let mel_filterbank = create_mel_filterbank(
            config.n_mels,
            config.n_fft / 2 + 1,
            sample_rate as f32,
            config.fmin,
            fmax,
        );

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        let fft_input = vec![0.0f32; config.n_fft];
        let fft_output = vec![realfft::num_complex::Complex::new(0.0, 0.0); config.n_fft / 2 + 1];

        Self {
            config,
            fft,
            mel_filterbank,
            window,
            fft_input,
            fft_output,
        }
    }

    /// Compute the MFCC matrix for a clip.
    ///
    /// Returns an (n_mfcc, n_frames) matrix; any non-empty clip yields at
    /// least one frame.
    pub fn compute(&mut self, audio: &[f32]) -> Result<Array2<f32>, ClassifyError> {
        if audio.is_empty() {
            return Err(ClassifyError::FeatureError("empty waveform".to_string()));
        }

        let n_frames = if audio.len() >= self.config.n_fft {
            1 + (audio.len() - self.config.n_fft) / self.config.hop_length
        } else {
            1
        };

        let mut mfcc = Array2::<f32>::zeros((self.config.n_mfcc, n_frames));

        for frame_idx in 0..n_frames {
            let start = frame_idx * self.config.hop_length;
            let end = (start + self.config.n_fft).min(audio.len());

            // Window the frame into the FFT buffer, zero-padding the tail
            self.fft_input.fill(0.0);
            for (i, &sample) in audio[start..end].iter().enumerate() {
                self.fft_input[i] = sample * self.window[i];
            }

            self.fft
                .process(&mut self.fft_input, &mut self.fft_output)
                .map_err(|e| ClassifyError::FeatureError(format!("FFT failed: {}", e)))?;

            // Power spectrum
            let power_spec: Vec<f32> = self
                .fft_output
                .iter()
                .map(|c| c.re * c.re + c.im * c.im)
                .collect();

            // Mel filterbank energies, floored before the log
            let log_energies: Vec<f32> = self
                .mel_filterbank
                .iter()
                .map(|filter| {
                    let energy: f32 = filter
                        .iter()
                        .zip(power_spec.iter())
                        .map(|(f, p)| f * p)
                        .sum();
                    energy.max(self.config.log_floor).ln()
                })
                .collect();

            // DCT-II keeps the first n_mfcc cepstral coefficients
            let cepstral = dct_ii(&log_energies, self.config.n_mfcc);
            for (coeff_idx, &c) in cepstral.iter().enumerate() {
                mfcc[[coeff_idx, frame_idx]] = c;
            }
        }

        Ok(mfcc)
    }
}

/// Convert frequency to mel scale
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel scale to frequency
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Orthonormal DCT-II of `input`, truncated to `n_out` coefficients
fn dct_ii(input: &[f32], n_out: usize) -> Vec<f32> {
    let n = input.len();
    let mut out = Vec::with_capacity(n_out.min(n));

    for k in 0..n_out.min(n) {
        let sum: f32 = input
            .iter()
            .enumerate()
            .map(|(i, &x)| x * (PI * (i as f32 + 0.5) * k as f32 / n as f32).cos())
            .sum();
        let scale = if k == 0 {
            (1.0 / n as f32).sqrt()
        } else {
            (2.0 / n as f32).sqrt()
        };
        out.push(sum * scale);
    }

    out
}

/// Create a mel filterbank matrix.
///
/// Returns `n_mels` triangular filters, each a weight vector over the FFT
/// bins.
fn create_mel_filterbank(
    n_mels: usize,
    n_fft_bins: usize,
    sample_rate: f32,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);

    // n_mels + 2 equally spaced points in mel scale
    let mel_points: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_min + (mel_max - mel_min) * (i as f32) / ((n_mels + 1) as f32))
        .collect();

    let hz_points: Vec<f32> = mel_points.iter().map(|&m| mel_to_hz(m)).collect();

    let fft_bin_points: Vec<f32> = hz_points
        .iter()
        .map(|&hz| (n_fft_bins as f32 - 1.0) * hz / (sample_rate / 2.0))
        .collect();

    let mut filterbank = Vec::with_capacity(n_mels);

    for i in 0..n_mels {
        let mut filter = vec![0.0f32; n_fft_bins];

        let left = fft_bin_points[i];
        let center = fft_bin_points[i + 1];
        let right = fft_bin_points[i + 2];

        for (bin, weight) in filter.iter_mut().enumerate() {
            let bin_f = bin as f32;

            if bin_f >= left && bin_f < center {
                // Rising edge
                *weight = (bin_f - left) / (center - left);
            } else if bin_f >= center && bin_f <= right {
                // Falling edge
                *weight = (right - bin_f) / (right - center);
            }
        }

        filterbank.push(filter);
    }

    filterbank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NUM_COEFFICIENTS;

    fn sine(freq_hz: f32, sample_rate: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_hz_to_mel() {
        assert!((hz_to_mel(0.0) - 0.0).abs() < 1e-6);

        // 1000 Hz is approximately 1000 mel (by design of the scale)
        let mel_1000 = hz_to_mel(1000.0);
        assert!((mel_1000 - 1000.0).abs() < 50.0);
    }

    #[test]
    fn test_mel_to_hz_roundtrip() {
        for hz in [100.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0] {
            let mel = hz_to_mel(hz);
            let hz_back = mel_to_hz(mel);
            assert!((hz - hz_back).abs() < 1e-3, "Roundtrip failed for {} Hz", hz);
        }
    }

    #[test]
    fn test_create_mel_filterbank() {
        let filterbank = create_mel_filterbank(40, 1025, 16000.0, 0.0, 8000.0);

        assert_eq!(filterbank.len(), 40);
        for filter in &filterbank {
            assert_eq!(filter.len(), 1025);
            for &weight in filter {
                assert!(weight >= 0.0);
            }
            let sum: f32 = filter.iter().sum();
            assert!(sum > 0.0, "Filter should have non-zero weights");
        }
    }

    #[test]
    fn test_dct_ii_constant_input() {
        // A constant signal concentrates all energy in coefficient 0
        let input = vec![1.0f32; 40];
        let out = dct_ii(&input, 13);
        assert_eq!(out.len(), 13);
        assert!(out[0].abs() > 1.0);
        for &c in &out[1..] {
            assert!(c.abs() < 1e-4);
        }
    }

    #[test]
    fn test_mfcc_row_count_fixed() {
        let mut extractor = MfccExtractor::new(16000, MfccConfig::default());
        for n in [1000, 16000, 48000] {
            let mfcc = extractor.compute(&sine(440.0, 16000, n)).unwrap();
            assert_eq!(mfcc.nrows(), NUM_COEFFICIENTS);
            assert!(mfcc.ncols() >= 1);
        }
    }

    #[test]
    fn test_mfcc_frame_count_tracks_duration() {
        let config = MfccConfig::default();
        let mut extractor = MfccExtractor::new(16000, config.clone());

        let audio = sine(440.0, 16000, 32000);
        let mfcc = extractor.compute(&audio).unwrap();
        let expected = 1 + (32000 - config.n_fft) / config.hop_length;
        assert_eq!(mfcc.ncols(), expected);
    }

    #[test]
    fn test_mfcc_short_clip_single_frame() {
        let mut extractor = MfccExtractor::new(16000, MfccConfig::default());
        let mfcc = extractor.compute(&sine(440.0, 16000, 256)).unwrap();
        assert_eq!(mfcc.ncols(), 1);
    }

    #[test]
    fn test_mfcc_empty_waveform_rejected() {
        let mut extractor = MfccExtractor::new(16000, MfccConfig::default());
        let result = extractor.compute(&[]);
        assert!(matches!(result, Err(ClassifyError::FeatureError(_))));
    }

    #[test]
    fn test_mfcc_deterministic() {
        let audio = sine(440.0, 16000, 16000);
        let mut a = MfccExtractor::new(16000, MfccConfig::default());
        let mut b = MfccExtractor::new(16000, MfccConfig::default());
        let first = a.compute(&audio).unwrap();
        let second = b.compute(&audio).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mfcc_all_finite() {
        // Silence hits the log floor rather than producing -inf
        let mut extractor = MfccExtractor::new(16000, MfccConfig::default());
        let mfcc = extractor.compute(&vec![0.0f32; 16000]).unwrap();
        assert!(mfcc.iter().all(|v| v.is_finite()));
    }
}

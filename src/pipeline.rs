//! End-to-end classification pipeline.
//!
//! Load → normalize → MFCC → canonicalize → infer → interpret. Every stage
//! is a pure transform except the classifier, which holds the loaded model
//! for the process lifetime.

use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info};

use crate::audio::{self, Waveform};
use crate::classifier::{self, EmotionClassifier, Prediction};
use crate::config::{MfccConfig, NUM_FRAMES};
use crate::error::ClassifyError;
use crate::features::{canonicalize, MfccExtractor};

/// Normalize a waveform and reduce it to the canonical feature matrix
pub fn preprocess(
    mut waveform: Waveform,
    config: &MfccConfig,
) -> Result<Array2<f32>, ClassifyError> {
    waveform.peak_normalize();

    let mut extractor = MfccExtractor::new(waveform.sample_rate, config.clone());
    let mfcc = extractor.compute(&waveform.samples)?;

    debug!(
        "Extracted {} frames from {:.2}s of audio",
        mfcc.ncols(),
        waveform.duration_secs()
    );

    Ok(canonicalize(&mfcc, NUM_FRAMES))
}

/// Inference backend behind the pipeline. Production code only ever holds
/// a loaded ONNX session; tests can substitute a fixed output vector so the
/// surrounding stages run without a model artifact.
enum Backend {
    Onnx(EmotionClassifier),
    #[cfg(test)]
    Canned(CannedClassifier),
}

/// Fixed-output classifier for tests, counting how often it is invoked
#[cfg(test)]
pub(crate) struct CannedClassifier {
    pub probabilities: Vec<f32>,
    pub calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

/// The full classification pipeline around a loaded model
pub struct Pipeline {
    backend: Backend,
    mfcc_config: MfccConfig,
}

impl Pipeline {
    /// Load the model and build the pipeline. Fatal on model load failure.
    pub fn new(model_path: &Path, n_threads: usize) -> Result<Self, ClassifyError> {
        let classifier = EmotionClassifier::new(model_path, n_threads)?;
        Ok(Self {
            backend: Backend::Onnx(classifier),
            mfcc_config: MfccConfig::default(),
        })
    }

    /// Build a pipeline whose classifier returns a fixed output vector
    #[cfg(test)]
    pub(crate) fn with_canned_output(
        probabilities: Vec<f32>,
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    ) -> Self {
        Self {
            backend: Backend::Canned(CannedClassifier {
                probabilities,
                calls,
            }),
            mfcc_config: MfccConfig::default(),
        }
    }

    /// Classify a WAV clip held in memory
    pub fn classify_bytes(&mut self, bytes: &[u8]) -> Result<Prediction, ClassifyError> {
        let waveform = audio::decode_wav(bytes)?;
        self.classify_waveform(waveform)
    }

    /// Classify a WAV clip on disk
    pub fn classify_path(&mut self, path: &Path) -> Result<Prediction, ClassifyError> {
        let waveform = audio::load_wav(path)?;
        self.classify_waveform(waveform)
    }

    fn classify_waveform(&mut self, waveform: Waveform) -> Result<Prediction, ClassifyError> {
        let features = preprocess(waveform, &self.mfcc_config)?;
        let probabilities = self.predict(&features)?;
        let prediction = classifier::interpret(&probabilities)?;

        info!(
            "Predicted {} ({:.1}%)",
            prediction.category.label(),
            prediction.probability * 100.0
        );

        Ok(prediction)
    }

    fn predict(&mut self, features: &Array2<f32>) -> Result<Vec<f32>, ClassifyError> {
        match &mut self.backend {
            Backend::Onnx(classifier) => classifier.predict(features),
            #[cfg(test)]
            Backend::Canned(canned) => {
                canned
                    .calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(canned.probabilities.clone())
            }
        }
    }
}

//! ONNX-based emotion classifier.
//!
//! Owns one session for the process lifetime; the input contract is a
//! canonical (13, 100) coefficient matrix reshaped to (1, 13, 100, 1).

use std::path::Path;

use ndarray::Array2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};

use super::EmotionCategory;
use crate::config::{NUM_COEFFICIENTS, NUM_FRAMES};
use crate::error::ClassifyError;

/// Pretrained emotion classifier backed by an ONNX session
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    /// Load the model artifact and verify its output arity.
    ///
    /// Any failure here is fatal for the service: a process that cannot
    /// classify must not start accepting uploads. The warm-up inference on a
    /// zero matrix catches an artifact whose output length disagrees with
    /// the category enumeration before the first real request does.
    pub fn new(model_path: &Path, n_threads: usize) -> Result<Self, ClassifyError> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelLoadError(format!(
                "model not found at {:?}",
                model_path
            )));
        }

        tracing::info!("Loading emotion model from {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| ClassifyError::ModelLoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifyError::ModelLoadError(e.to_string()))?
            .with_intra_threads(n_threads)
            .map_err(|e| ClassifyError::ModelLoadError(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifyError::ModelLoadError(e.to_string()))?;

        let mut classifier = Self { session };

        let warmup = classifier
            .predict(&Array2::<f32>::zeros((NUM_COEFFICIENTS, NUM_FRAMES)))
            .map_err(|e| ClassifyError::ModelLoadError(format!("warm-up inference: {}", e)))?;
        if warmup.len() != EmotionCategory::ALL.len() {
            return Err(ClassifyError::ModelLoadError(format!(
                "model outputs {} classes, category list has {}",
                warmup.len(),
                EmotionCategory::ALL.len()
            )));
        }

        tracing::info!("Emotion model loaded, {} output classes", warmup.len());

        Ok(classifier)
    }

    /// Run inference on a canonical feature matrix.
    ///
    /// Returns the model's output distribution over the categories. A
    /// matrix of the wrong shape is a bug in the calling pipeline, not a
    /// request-level condition.
    pub fn predict(&mut self, features: &Array2<f32>) -> Result<Vec<f32>, ClassifyError> {
        debug_assert_eq!(features.dim(), (NUM_COEFFICIENTS, NUM_FRAMES));

        // Batch and channel dimensions of size 1; row-major flatten of
        // (13, 100) lines up with the (1, 13, 100, 1) tensor layout.
        let input_shape = [1_usize, features.nrows(), features.ncols(), 1_usize];
        let input_data: Vec<f32> = features.iter().copied().collect();

        let input_tensor = Value::from_array((input_shape, input_data))
            .map_err(|e| ClassifyError::InferenceError(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifyError::InferenceError(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifyError::InferenceError("no output tensor".to_string()))?;

        let tensor = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::InferenceError(e.to_string()))?;

        Ok(tensor.1.to_vec())
    }
}

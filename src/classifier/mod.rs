//! Emotion categories, result interpretation, and the ONNX classifier.
//!
//! The classifier outputs a probability distribution over a fixed ordered
//! category list; the ordering here must match the ordering the model was
//! trained with. That coupling is verified at startup by the provider's
//! warm-up check (output length vs. category count) but the per-index
//! semantics are a contract with the model artifact, not something the code
//! can prove.

pub mod provider;

pub use provider::EmotionClassifier;

use serde::Serialize;

use crate::error::ClassifyError;

/// Default asset served for categories without a dedicated GIF
pub const DEFAULT_ASSET: &str = "static/emojis/tranquilidadAndres.gif";

/// The emotion categories the model distinguishes, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmotionCategory {
    Agradecimiento,
    Ansiedad,
    Curiosidad,
    Expectativa,
    Felicidad,
    Seguridad,
    Tranquilidad,
}

impl EmotionCategory {
    /// All categories in model output order. The index into this array is
    /// the index into the model's probability vector.
    pub const ALL: [EmotionCategory; 7] = [
        EmotionCategory::Agradecimiento,
        EmotionCategory::Ansiedad,
        EmotionCategory::Curiosidad,
        EmotionCategory::Expectativa,
        EmotionCategory::Felicidad,
        EmotionCategory::Seguridad,
        EmotionCategory::Tranquilidad,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmotionCategory::Agradecimiento => "Agradecimiento",
            EmotionCategory::Ansiedad => "Ansiedad",
            EmotionCategory::Curiosidad => "Curiosidad",
            EmotionCategory::Expectativa => "Expectativa",
            EmotionCategory::Felicidad => "Felicidad",
            EmotionCategory::Seguridad => "Seguridad",
            EmotionCategory::Tranquilidad => "Tranquilidad",
        }
    }

    /// Relative path of the GIF shown for this category. Total over the
    /// enum; categories without their own GIF share the default.
    pub fn asset(&self) -> &'static str {
        match self {
            EmotionCategory::Felicidad => "static/emojis/felizAndres.gif",
            EmotionCategory::Ansiedad => "static/emojis/ansiedadAndres.gif",
            EmotionCategory::Curiosidad => "static/emojis/curiosidadAndres.gif",
            EmotionCategory::Tranquilidad => "static/emojis/tranquilidadAndres.gif",
            EmotionCategory::Agradecimiento
            | EmotionCategory::Expectativa
            | EmotionCategory::Seguridad => DEFAULT_ASSET,
        }
    }
}

/// Final classification result returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub category: EmotionCategory,
    pub probability: f32,
    pub asset: String,
}

/// Interpret a model output vector as a prediction.
///
/// Selects the first-occurrence argmax; ties resolve to the lowest index.
/// The vector length must match the category count; a mismatch means the
/// artifact and the enumeration disagree and the result would be garbage.
pub fn interpret(probabilities: &[f32]) -> Result<Prediction, ClassifyError> {
    if probabilities.len() != EmotionCategory::ALL.len() {
        return Err(ClassifyError::InferenceError(format!(
            "model produced {} outputs, expected {}",
            probabilities.len(),
            EmotionCategory::ALL.len()
        )));
    }

    let mut best_idx = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best_idx] {
            best_idx = i;
        }
    }

    let category = EmotionCategory::ALL[best_idx];
    Ok(Prediction {
        category,
        probability: probabilities[best_idx],
        asset: category.asset().to_string(),
    })
}

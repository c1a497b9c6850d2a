//! Speech emotion classification service.
//!
//! Takes a short WAV clip, reduces it to a fixed-shape MFCC matrix, runs a
//! pretrained ONNX classifier over it, and returns the winning emotion
//! category with its probability and a matching GIF asset.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod server;


pub use classifier::{EmotionCategory, Prediction};
pub use config::Config;
pub use error::ClassifyError;
pub use pipeline::Pipeline;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Number of MFCC coefficients per frame. Must match what the model was
/// trained with.
pub const NUM_COEFFICIENTS: usize = 13;

/// Fixed number of time frames the model input is canonicalized to.
pub const NUM_FRAMES: usize = 100;

/// Environment variable that overrides the model artifact path.
pub const MODEL_PATH_ENV: &str = "EMOTION_MODEL_PATH";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,
    /// Path to the ONNX emotion model artifact
    pub model_path: Option<PathBuf>,
    /// Directory served verbatim under /static
    pub static_dir: PathBuf,
    /// Listen address for the HTTP server
    pub host: [u8; 4],
    pub port: u16,
    /// Number of threads for ONNX inference
    pub n_threads: usize,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            model_path: None,
            static_dir: PathBuf::from("static"),
            host: [0, 0, 0, 0],
            port: 7210,
            n_threads: 2,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".emotion-classifier"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file or return default
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Failed to load config, using default: {}", e);
                Self::default()
            }
        }
    }

    /// Load config from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = serde_json::from_str(&contents).context("Failed to parse config")?;
        Ok(config)
    }

    /// Resolve the model path: env override first, then the config entry,
    /// then the default location under the config directory.
    pub fn resolve_model_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(MODEL_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.model_path {
            return Ok(path.clone());
        }
        Ok(Self::config_dir()?.join("models").join("emotion_cnn.onnx"))
    }
}

/// Parameters of the MFCC front end. Conventional short-time analysis
/// defaults; the coefficient count is shared with the model contract.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// FFT size (also the analysis window length)
    pub n_fft: usize,
    /// Hop length between frames (in samples)
    pub hop_length: usize,
    /// Number of mel frequency bands
    pub n_mels: usize,
    /// Number of cepstral coefficients kept per frame
    pub n_mfcc: usize,
    /// Minimum frequency for the mel filterbank (Hz)
    pub fmin: f32,
    /// Maximum frequency for the mel filterbank (Hz); None means Nyquist
    pub fmax: Option<f32>,
    /// Floor applied before the log for numerical stability
    pub log_floor: f32,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 40,
            n_mfcc: NUM_COEFFICIENTS,
            fmin: 0.0,
            fmax: None,
            log_floor: 1e-10,
        }
    }
}

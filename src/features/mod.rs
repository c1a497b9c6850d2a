//! MFCC feature extraction and shape canonicalization.
//!
//! Turns a normalized waveform into the fixed-shape coefficient matrix the
//! classifier was trained against:
//! 1. Short-time spectral analysis (Hann window + real FFT)
//! 2. Mel-scale triangular filterbank and log energies
//! 3. DCT-II for cepstral coefficients
//! 4. Truncate or zero-pad the time axis to a fixed frame count

pub mod mfcc;
pub mod shape;

pub use mfcc::MfccExtractor;
pub use shape::canonicalize;

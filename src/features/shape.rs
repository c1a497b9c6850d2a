//! Canonicalization of the MFCC time axis.
//!
//! The classifier accepts exactly one shape. Long clips lose everything
//! past the first `target_frames` columns; short clips gain zero columns on
//! the right. The model was trained against this convention, so it must be
//! preserved exactly (no resampling or interpolation).

use ndarray::{s, Array2};

/// Force the column count of a feature matrix to exactly `target_frames`
pub fn canonicalize(features: &Array2<f32>, target_frames: usize) -> Array2<f32> {
    let n_cols = features.ncols();

    if n_cols == target_frames {
        return features.clone();
    }

    if n_cols > target_frames {
        // Keep only the leading frames
        return features.slice(s![.., ..target_frames]).to_owned();
    }

    // Right-pad with zero frames
    let mut out = Array2::<f32>::zeros((features.nrows(), target_frames));
    out.slice_mut(s![.., ..n_cols]).assign(features);
    out
}

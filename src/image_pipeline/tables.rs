//! Color matrix and tone curve tables
//!
//! Pure numeric builders for the two lookup tables the accelerator consumes.

mod curve;
mod matrix;
pub mod types;

pub use curve::{tone_curve, CURVE_LEN};
pub use matrix::{color_matrix, interpolation_weight};
pub use types::{ColorMatrix, ColorTransform, IlluminantMatrices, ToneParams};

//! Table builder inputs and outputs

use crate::image_pipeline::tables::curve::{tone_curve, CURVE_LEN};
use crate::image_pipeline::tables::matrix::color_matrix;

/// Q8 fixed-point 3x4 color matrix: rows are output channels, column 3 is the offset.
pub type ColorMatrix = [[i16; 4]; 3];

/// Per-call tone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    /// Scene color temperature in Kelvin.
    pub color_temp: f32,
    pub gamma: f32,
    pub contrast: f32,
    /// Raw level mapped to black; levels at or below it produce 0.
    pub black_level: i32,
    /// Raw level mapped to white; levels above it produce 255.
    pub white_level: i32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            color_temp: 3700.0,
            gamma: 2.0,
            contrast: 50.0,
            black_level: 25,
            white_level: 1023,
        }
    }
}

/// Reference illuminant matrices the color matrix is interpolated between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IlluminantMatrices {
    pub m3200: [[f32; 4]; 3],
    pub m7000: [[f32; 4]; 3],
}

impl IlluminantMatrices {
    /// Sensor calibration shipped with the Halide camera pipe (Nokia N900).
    pub const CAMERA_PIPE: IlluminantMatrices = IlluminantMatrices {
        m3200: [
            [1.6697, -0.2693, -0.4004, -42.4346],
            [-0.3576, 1.0615, 1.5949, -37.1158],
            [-0.2175, -1.8751, 6.9640, -26.6970],
        ],
        m7000: [
            [2.2997, -0.4478, 0.1706, -39.0923],
            [-0.3826, 1.5906, -0.2080, -25.4311],
            [-0.0888, -0.7344, 2.2832, -20.0826],
        ],
    };
}

/// Both tables for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTransform {
    pub matrix: ColorMatrix,
    pub curve: [u8; CURVE_LEN],
}

impl ColorTransform {
    pub fn build(params: &ToneParams, illuminants: &IlluminantMatrices) -> Self {
        Self {
            matrix: color_matrix(params.color_temp, illuminants),
            curve: tone_curve(params.gamma, params.contrast, params.black_level, params.white_level),
        }
    }

    /// Scalar reference for one pixel: matrix in Q8, floor division by 256,
    /// clamp into the curve's domain, look up.
    pub fn apply(&self, rgb: [u16; 3]) -> [u8; 3] {
        let [r, g, b] = rgb.map(i32::from);
        let mut out = [0u8; 3];
        for (c, row) in self.matrix.iter().enumerate() {
            let [m0, m1, m2, offset] = (*row).map(i32::from);
            let acc = offset
                .wrapping_add(m0.wrapping_mul(r))
                .wrapping_add(m1.wrapping_mul(g))
                .wrapping_add(m2.wrapping_mul(b));
            let corrected = acc.div_euclid(256) as i16;
            out[c] = self.curve[(corrected as i32).clamp(0, CURVE_LEN as i32 - 1) as usize];
        }
        out
    }

    /// Matrix as transferred to the device: 12 little-endian `i16`, row-major.
    pub fn matrix_bytes(&self) -> Vec<u8> {
        self.matrix
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    /// Rebuilds the tables from their device byte images.
    pub fn from_device_bytes(matrix: &[u8], curve: &[u8]) -> Option<Self> {
        if matrix.len() < 24 || curve.len() < CURVE_LEN {
            return None;
        }
        let mut decoded = [[0i16; 4]; 3];
        for (n, pair) in matrix.chunks_exact(2).take(12).enumerate() {
            decoded[n / 4][n % 4] = i16::from_le_bytes([pair[0], pair[1]]);
        }
        let mut table = [0u8; CURVE_LEN];
        table.copy_from_slice(&curve[..CURVE_LEN]);
        Some(Self {
            matrix: decoded,
            curve: table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_transform() -> ColorTransform {
        let mut curve = [0u8; CURVE_LEN];
        for (v, slot) in curve.iter_mut().enumerate() {
            *slot = (v / 4) as u8;
        }
        ColorTransform {
            matrix: [[256, 0, 0, 0], [0, 256, 0, 0], [0, 0, 256, 0]],
            curve,
        }
    }

    #[test]
    fn test_apply_identity_matrix() {
        let t = identity_transform();
        assert_eq!(t.apply([0, 400, 1023]), [0, 100, 255]);
    }

    #[test]
    fn test_apply_clamps_into_curve_domain() {
        let mut t = identity_transform();
        t.matrix[0] = [512, 0, 0, 0];
        t.matrix[1] = [0, 256, 0, -256 * 10];
        assert_eq!(t.apply([1000, 5, 0])[0], 255);
        assert_eq!(t.apply([1000, 5, 0])[1], 0);
    }

    #[test]
    fn test_apply_floors_negative_quotients() {
        let mut t = identity_transform();
        // -1 / 256 floors to -1, which clamps to 0; 300 / 256 floors to 1.
        t.matrix[2] = [0, 0, 0, -1];
        t.curve[1] = 77;
        t.matrix[0] = [0, 0, 0, 300];
        let out = t.apply([0, 0, 0]);
        assert_eq!(out[2], t.curve[0]);
        assert_eq!(out[0], 77);
    }

    #[test]
    fn test_device_bytes_round_trip() {
        let t = ColorTransform::build(&ToneParams::default(), &IlluminantMatrices::CAMERA_PIPE);
        let bytes = t.matrix_bytes();
        assert_eq!(bytes.len(), 24);
        let back = ColorTransform::from_device_bytes(&bytes, &t.curve).unwrap();
        assert_eq!(back, t);
        assert!(ColorTransform::from_device_bytes(&bytes[..10], &t.curve).is_none());
    }
}

use tracing::debug;

use crate::image_pipeline::tables::types::{ColorMatrix, IlluminantMatrices};

/// Weight of the 3200K matrix at `color_temp`: 0 at 3200K, 1 at 7000K.
///
/// The weight grows with Kelvin, so hotter color temperatures lean on the 3200K matrix.
///
/// The constants are the fit used by the shipped kernel and are kept verbatim.
pub fn interpolation_weight(color_temp: f32) -> f32 {
    let t = (1.0f32 / color_temp) * 5894.74f32;
    1.84211f32 - t
}

/// Blends the two illuminant matrices and converts to Q8.
pub fn color_matrix(color_temp: f32, illuminants: &IlluminantMatrices) -> ColorMatrix {
    let t = (1.0f32 / color_temp) * 5894.74f32;
    let w3200 = 1.84211f32 - t;
    let w7000 = t + -0.842105f32;

    let mut matrix = [[0i16; 4]; 3];
    for (y, row) in matrix.iter_mut().enumerate() {
        for (v, slot) in row.iter_mut().enumerate() {
            let blended = illuminants.m3200[y][v] * w3200 + illuminants.m7000[y][v] * w7000;
            // Float to int casts saturate, so out-of-range blends pin to i16::MIN/MAX.
            *slot = (blended * 256.0f32).round() as i16;
        }
    }

    debug!(color_temp, weight = w3200, ?matrix, "Built color matrix");
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    // Entries are chosen away from rounding boundaries after the x256 scale.
    const M3200: [[f32; 4]; 3] = [
        [1.5, -0.25, 0.125, -40.0],
        [-0.375, 1.0, 1.625, -37.0],
        [-0.2, -1.9, 7.0, -26.7],
    ];
    const M7000: [[f32; 4]; 3] = [
        [2.25, -0.5, 0.2, -39.1],
        [-0.4, 1.6, -0.2, -25.4],
        [-0.1, -0.7, 2.3, -20.1],
    ];

    fn scaled(m: &[[f32; 4]; 3]) -> ColorMatrix {
        m.map(|row| row.map(|v| (v * 256.0).round() as i16))
    }

    fn illuminants() -> IlluminantMatrices {
        IlluminantMatrices { m3200: M3200, m7000: M7000 }
    }

    #[test]
    fn test_weight_endpoints() {
        assert!(interpolation_weight(3200.0).abs() < 1e-4);
        assert!((interpolation_weight(7000.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_weight_increases_with_kelvin() {
        let weights: Vec<f32> = (3200..=7000).step_by(200).map(|k| interpolation_weight(k as f32)).collect();
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_weight_one_yields_3200_matrix() {
        // The weight reaches 1 at 7000K.
        assert_eq!(color_matrix(7000.0, &illuminants()), scaled(&M3200));
    }

    #[test]
    fn test_weight_zero_yields_7000_matrix() {
        assert_eq!(color_matrix(3200.0, &illuminants()), scaled(&M7000));
    }

    #[test]
    fn test_midpoint_blend() {
        // Weight 0.5 at 1 / (1.34211 / 5894.74) Kelvin.
        let kelvin = 5894.74 / 1.34211;
        let m = color_matrix(kelvin, &illuminants());
        let expected = ((1.5f32 + 2.25) * 0.5 * 256.0).round() as i16;
        assert!((m[0][0] - expected).abs() <= 1);
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let huge = IlluminantMatrices { m3200: [[1000.0; 4]; 3], m7000: [[1000.0; 4]; 3] };
        assert_eq!(color_matrix(5000.0, &huge)[0][0], i16::MAX);
    }
}

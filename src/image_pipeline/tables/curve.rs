use tracing::debug;

/// Entries in the tone curve: one per 10-bit raw level.
pub const CURVE_LEN: usize = 1024;

/// Builds the 10-bit to 8-bit tone curve.
///
/// Levels are normalised between `black_level` and `white_level`, gamma
/// corrected, then bent by an S-curve whose slope at the midpoint is
/// `2^(contrast / 100)`. Every step runs in `f32` in a fixed order so the table
/// matches the one the kernel binary was verified against bit for bit.
pub fn tone_curve(gamma: f32, contrast: f32, black_level: i32, white_level: i32) -> [u8; CURVE_LEN] {
    let inv_range = 1.0f32 / (white_level - black_level) as f32;
    let inv_gamma = 1.0f32 / gamma;
    let b = 2.0f32.powf(contrast * 0.01f32);
    let a = 2.0f32 - (2.0f32 - b) * 2.0f32;

    let mut curve = [0u8; CURVE_LEN];
    for (v, slot) in curve.iter_mut().enumerate() {
        let level = v as i32;
        if level <= black_level {
            continue;
        }
        if level > white_level {
            *slot = u8::MAX;
            continue;
        }

        let x = ((level - black_level) as f32 * inv_range).min(1.0f32).max(0.0f32);
        let g = x.powf(inv_gamma);
        let y = if 0.5f32 < g {
            let h = 1.0f32 - g;
            1.0f32 - h * (a * h - b + 2.0f32)
        } else {
            g * (a * g - b + 2.0f32)
        };
        *slot = (y * 255.0f32 + 0.5f32).min(255.0f32).max(0.0f32) as u8;
    }

    debug!(gamma, contrast, black_level, white_level, "Built tone curve");
    curve
}

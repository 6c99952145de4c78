//! RAW image data types

/// Bit depth of the tone curve's input domain.
pub const CURVE_BITS: u32 = 10;

/// Represents decoded RAW image data
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Raw pixel data (single channel Bayer pattern)
    pub data: Vec<u16>,
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
    /// Sensor black level, in sample units
    pub black_level: u16,
    /// Sensor white level, in sample units
    pub white_level: u16,
}

impl RawImageData {
    /// Rescales samples and levels from the sensor's bit depth to `bits`.
    pub fn scaled_to_bits(&self, bits: u32) -> RawImageData {
        let scale = |v: u16| -> u16 {
            if self.bits_per_sample > bits {
                v >> (self.bits_per_sample - bits)
            } else {
                v << (bits - self.bits_per_sample)
            }
        };
        RawImageData {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| scale(v)).collect(),
            bits_per_sample: bits,
            black_level: scale(self.black_level),
            white_level: scale(self.white_level),
        }
    }
}

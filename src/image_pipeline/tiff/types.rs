//! Frontend conversion configuration and image types

/// TIFF compression methods
#[derive(Debug, Clone, Copy)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced (default)
    DeflateBalanced,
}

/// Interleaved 8-bit RGB image ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb8Image {
    pub width: usize,
    pub height: usize,
    /// `r, g, b` per pixel, rows top to bottom
    pub data: Vec<u8>,
}

impl Rgb8Image {
    /// Interleaves three `width * height` planes stored one after another.
    pub fn from_planar(width: usize, height: usize, planes: &[u8]) -> Self {
        let plane = width * height;
        let mut data = Vec::with_capacity(plane * 3);
        for n in 0..plane {
            data.extend_from_slice(&[planes[n], planes[plane + n], planes[2 * plane + n]]);
        }
        Self { width, height, data }
    }
}

/// Configuration for RAW to curved TIFF conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    /// Note: Predictor adds processing time, set to None for maximum speed
    pub predictor: Option<u16>,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
    /// Scene color temperature in Kelvin
    pub color_temp: f32,
    pub gamma: f32,
    pub contrast: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            color_temp: 3700.0,
            gamma: 2.0,
            contrast: 50.0,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    color_temp: Option<f32>,
    gamma: Option<f32>,
    contrast: Option<f32>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn color_temp(mut self, kelvin: f32) -> Self {
        self.color_temp = Some(kelvin);
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn contrast(mut self, contrast: f32) -> Self {
        self.contrast = Some(contrast);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            color_temp: self.color_temp.unwrap_or(default.color_temp),
            gamma: self.gamma.unwrap_or(default.gamma),
            contrast: self.contrast.unwrap_or(default.contrast),
        }
    }
}

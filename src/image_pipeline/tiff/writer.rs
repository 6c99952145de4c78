use std::io::Write;

use crate::image_pipeline::common::error::ConversionResult;
use crate::image_pipeline::tiff::types::{ConversionConfig, Rgb8Image};

pub trait TiffWriter {
    fn write_rgb8(&self, image: &Rgb8Image, output: &mut dyn Write, config: &ConversionConfig) -> ConversionResult<()>;
}

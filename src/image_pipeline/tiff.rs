//! TIFF writing module
//!
//! Encodes the curved 8-bit RGB result with the configured compression.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, Rgb8Image, TiffCompression};
pub use writer::TiffWriter;

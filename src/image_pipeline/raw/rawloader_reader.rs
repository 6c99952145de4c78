//! RAW image reader implementation using the rawloader library.
//!
//! Decodes the sensor data of any format rawloader supports and extracts the
//! bit depth and black/white levels the tone curve needs.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, ConversionResult};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::RawImageData;

/// RAW image reader that uses the rawloader library for decoding.
///
/// Supports any RAW format rawloader can decode, including Sony ARW,
/// Fujifilm RAF and DNG.
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    /// Reads and decodes RAW image data from a byte array.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use curved_offload::image_pipeline::{RawImageReader, RawLoaderReader};
    ///
    /// let reader = RawLoaderReader;
    /// let raw_bytes = std::fs::read("image.arw").unwrap();
    /// let image_data = reader.read_raw(&raw_bytes).unwrap();
    /// ```
    fn read_raw(&self, data: &[u8]) -> ConversionResult<RawImageData> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;

        debug!("Decoded image: {}x{}", width, height);

        // Float data is normalized to 0.0-1.0
        let data: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        // The white level is the largest value the sensor produces, so its
        // bit length is the sensor's real bit depth.
        let white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let black_level = decoded.blacklevels.iter().min().copied().unwrap_or(0);
        let bits_per_sample = if white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - white_level.leading_zeros()
        };

        debug!(
            bits_per_sample,
            black_level, white_level, "Sensor levels"
        );

        Ok(RawImageData {
            width,
            height,
            data,
            bits_per_sample,
            black_level,
            white_level,
        })
    }
}

use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::{
    accelerator::{AcceleratorRuntime, SoftwareAccelerator},
    buffer::{BufferDescriptor, HostView, HostViewMut},
    common::error::{ConversionError, ConversionResult},
    offload::{OffloadConfig, OffloadPipeline, Outcome, ProcessReport},
    raw::{RawImageReader, RawLoaderReader, CURVE_BITS},
    tables::{IlluminantMatrices, ToneParams},
    tiff::{ConversionConfig, Rgb8Image, StandardTiffWriter, TiffWriter},
    tiling::DEMOSAIC_BORDER,
};

/// Decodes a RAW file, runs the curved stage through the offload pipeline and
/// writes the 8-bit RGB result as TIFF.
pub struct RawToCurvedPipeline<R: RawImageReader, W: TiffWriter, A: AcceleratorRuntime> {
    reader: R,
    writer: W,
    offload: OffloadPipeline<A>,
    illuminants: IlluminantMatrices,
    config: ConversionConfig,
}

impl RawToCurvedPipeline<RawLoaderReader, StandardTiffWriter, SoftwareAccelerator> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: RawLoaderReader,
            writer: StandardTiffWriter,
            offload: OffloadPipeline::new(OffloadConfig::default()),
            illuminants: IlluminantMatrices::CAMERA_PIPE,
            config,
        }
    }
}

impl<R: RawImageReader, W: TiffWriter, A: AcceleratorRuntime> RawToCurvedPipeline<R, W, A> {
    pub fn with_custom(reader: R, writer: W, offload: OffloadPipeline<A>, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            offload,
            illuminants: IlluminantMatrices::CAMERA_PIPE,
            config,
        }
    }

    pub fn with_illuminants(mut self, illuminants: IlluminantMatrices) -> Self {
        self.illuminants = illuminants;
        self
    }

    fn validate_dimensions(&self, width: usize, height: usize, samples: usize) -> ConversionResult<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width.checked_mul(height) != Some(samples) {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Planar output extents left after trimming the demosaic border.
    fn output_extents(width: usize, height: usize) -> ConversionResult<(i32, i32)> {
        let trimmed = |extent: usize| {
            i32::try_from(extent)
                .ok()
                .map(|e| e - DEMOSAIC_BORDER)
                .filter(|e| *e > 0)
        };
        match (trimmed(width), trimmed(height)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(ConversionError::InvalidDimensions(width, height)),
        }
    }

    #[instrument(skip(self, input_data, output, binary), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write, binary: &Path) -> ConversionResult<ProcessReport> {
        info!("Starting RAW to curved TIFF conversion");

        let raw_image = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)?
        };

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = raw_image.width,
                height = raw_image.height
            ).entered();
            self.validate_dimensions(raw_image.width, raw_image.height, raw_image.data.len())?;
        }
        let (out_width, out_height) = Self::output_extents(raw_image.width, raw_image.height)?;

        let scaled = raw_image.scaled_to_bits(CURVE_BITS);
        let (width, height) = (scaled.width as i32, scaled.height as i32);

        let params = ToneParams {
            color_temp: self.config.color_temp,
            gamma: self.config.gamma,
            contrast: self.config.contrast,
            black_level: scaled.black_level as i32,
            white_level: scaled.white_level as i32,
        };

        let mut planes = vec![0u8; out_width as usize * out_height as usize * 3];
        let mut input = HostView::new(&scaled.data, BufferDescriptor::for_element::<u16>(&[width, height]));
        let mut processed = HostViewMut::new(
            &mut planes,
            BufferDescriptor::for_element::<u8>(&[out_width, out_height, 3]),
        );
        let report = match self
            .offload
            .process(&params, &self.illuminants, &mut input, &mut processed, binary)?
        {
            Outcome::Completed(report) => report,
            Outcome::SizingQuery => return Err(ConversionError::InvalidDimensions(scaled.width, scaled.height)),
        };

        let rgb = {
            let _span = tracing::info_span!("interleave").entered();
            Rgb8Image::from_planar(out_width as usize, out_height as usize, &planes)
        };

        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_rgb8(&rgb, output, &self.config)?;
        }

        info!(
            width = rgb.width,
            height = rgb.height,
            "Conversion complete"
        );
        Ok(report)
    }

    #[instrument(skip(self, input_path, output_path, binary))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        binary: &Path,
    ) -> ConversionResult<ProcessReport> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.convert(&input_data, &mut output_file, binary)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }

    pub fn offload(&self) -> &OffloadPipeline<A> {
        &self.offload
    }
}

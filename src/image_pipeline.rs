//! Image processing pipeline module
//!
//! Offloads the `curved` camera stage (color matrix plus tone curve) to a
//! tiled accelerator: buffer contracts, tile planning, host packing, lookup
//! tables and the coordinator that sequences one call. The RAW reader, TIFF
//! writer and conversion pipeline form the frontend around it.

pub mod accelerator;
pub mod buffer;
pub mod common;
pub mod conversions;
pub mod offload;
pub mod packing;
pub mod raw;
pub mod tables;
pub mod tiff;
pub mod tiling;
pub mod validate;

pub use common::{
    ConversionError,
    ConversionResult,
    ErrorCode,
    OffloadError,
    Result,
    StageError,
};

pub use buffer::{BufferDescriptor, Dim, HostView, HostViewMut};

pub use accelerator::{AcceleratorRuntime, CudaRuntime, SoftwareAccelerator};

pub use offload::{
    curved,
    OffloadConfig,
    OffloadConfigBuilder,
    OffloadPipeline,
    Outcome,
    ProcessReport,
    Stage,
};

pub use tables::{ColorTransform, IlluminantMatrices, ToneParams};

pub use tiling::{TileGeometry, TilePlan};

pub use raw::{
    RawImageData,
    RawImageReader,
    RawLoaderReader,
};

pub use tiff::{
    TiffCompression,
    ConversionConfig,
    ConversionConfigBuilder,
    TiffWriter,
    StandardTiffWriter,
};

pub use conversions::RawToCurvedPipeline;

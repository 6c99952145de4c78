use std::fmt;

use thiserror::Error;

use crate::image_pipeline::offload::Stage;

/// Largest byte or element count any single buffer may address.
pub const MAX_BUFFER_SIZE: i64 = i32::MAX as i64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffloadError {
    #[error("{buffer} has type {type_name} but elem_size of the buffer passed in is {actual} instead of {expected}")]
    BadElementSize {
        buffer: &'static str,
        type_name: &'static str,
        expected: i32,
        actual: i32,
    },

    #[error("{}", describe_out_of_bounds(.buffer, .dimension, .min_touched, .max_touched, .min_valid, .max_valid))]
    AccessOutOfBounds {
        buffer: &'static str,
        dimension: usize,
        min_touched: i64,
        max_touched: i64,
        min_valid: i64,
        max_valid: i64,
    },

    #[error("Constraint violated: {variable} ({actual}) == {expected}")]
    ConstraintViolated {
        variable: String,
        actual: i64,
        expected: i64,
    },

    #[error("Total allocation for buffer {buffer} is {size}, which exceeds the maximum size of {max}")]
    BufferAllocationTooLarge {
        buffer: &'static str,
        size: i64,
        max: i64,
    },

    #[error("Product of extents for buffer {buffer} is {size}, which exceeds the maximum size of {max}")]
    BufferExtentsTooLarge {
        buffer: &'static str,
        size: i64,
        max: i64,
    },

    #[error("Host storage for buffer {buffer} holds {actual} elements but the descriptor addresses {required}")]
    HostBufferTooSmall {
        buffer: &'static str,
        required: i64,
        actual: usize,
    },

    #[error("Accelerator device {device} from vendor {vendor} not found")]
    DeviceNotFound { vendor: String, device: String },

    #[error("Failed to load accelerator binary {path}: {reason}")]
    BinaryLoadFailed { path: String, reason: String },

    #[error("Failed to build accelerator program: {0}")]
    BuildFailed(String),

    #[error("Kernel execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Transfer of {buffer} failed: {reason}")]
    TransferFailed { buffer: &'static str, reason: String },

    #[error("Out of memory allocating {bytes} bytes for {buffer}")]
    OutOfMemory { buffer: &'static str, bytes: usize },
}

fn describe_out_of_bounds(
    buffer: &str,
    dimension: &usize,
    min_touched: &i64,
    max_touched: &i64,
    min_valid: &i64,
    max_valid: &i64,
) -> String {
    if min_touched < min_valid {
        format!("{buffer} is accessed at {min_touched}, which is before the min ({min_valid}) in dimension {dimension}")
    } else {
        format!("{buffer} is accessed at {max_touched}, which is beyond the max ({max_valid}) in dimension {dimension}")
    }
}

impl OffloadError {
    /// Stable numeric code, reported through [`ErrorCode`].
    pub fn code(&self) -> i32 {
        match self {
            OffloadError::BadElementSize { .. } => -3,
            OffloadError::AccessOutOfBounds { .. } => -4,
            OffloadError::BufferAllocationTooLarge { .. } => -5,
            OffloadError::BufferExtentsTooLarge { .. } => -6,
            OffloadError::ConstraintViolated { .. } => -8,
            OffloadError::OutOfMemory { .. } => -11,
            OffloadError::HostBufferTooSmall { .. } => -12,
            OffloadError::TransferFailed { .. } => -15,
            OffloadError::DeviceNotFound { .. } => -19,
            OffloadError::ExecutionFailed(_) => -23,
            OffloadError::BinaryLoadFailed { .. } => -27,
            OffloadError::BuildFailed(_) => -28,
        }
    }

    /// Shape errors are detected before any transfer; the caller can fix the descriptors.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            OffloadError::BadElementSize { .. }
                | OffloadError::AccessOutOfBounds { .. }
                | OffloadError::ConstraintViolated { .. }
                | OffloadError::BufferAllocationTooLarge { .. }
                | OffloadError::BufferExtentsTooLarge { .. }
                | OffloadError::HostBufferTooSmall { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OffloadError>;

/// An [`OffloadError`] tagged with the pipeline stage that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: OffloadError,
}

impl StageError {
    pub fn new(stage: Stage, source: OffloadError) -> Self {
        Self { stage, source }
    }

    pub fn code(&self) -> i32 {
        self.source.code()
    }
}

/// Flat status returned by [`curved`](crate::image_pipeline::curved): 0 on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<&OffloadError> for ErrorCode {
    fn from(err: &OffloadError) -> Self {
        ErrorCode(err.code())
    }
}

impl From<&StageError> for ErrorCode {
    fn from(err: &StageError) -> Self {
        ErrorCode(err.code())
    }
}

impl<T> From<&std::result::Result<T, StageError>> for ErrorCode {
    fn from(result: &std::result::Result<T, StageError>) -> Self {
        match result {
            Ok(_) => ErrorCode::SUCCESS,
            Err(err) => err.into(),
        }
    }
}

/// Errors of the RAW to TIFF frontend around the offload.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode RAW image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error(transparent)]
    Offload(#[from] StageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Pipeline conversions module
//!
//! Orchestrates the RAW to curved TIFF conversion around the offload pipeline.

mod raw_to_curved;


pub use raw_to_curved::RawToCurvedPipeline;

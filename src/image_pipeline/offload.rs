//! Offload coordination
//!
//! Sequences one call through validation, planning, table building, packing,
//! device transfer, kernel execution, read-back and unpacking.

mod coordinator;
pub mod stage;
pub mod timing;
pub mod types;


pub use coordinator::{curved, OffloadPipeline, Outcome, ProcessReport};
pub use stage::Stage;
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use types::{OffloadConfig, OffloadConfigBuilder};

//! Contract validation
//!
//! Answers sizing requests for unallocated buffers, then runs the ordered
//! shape checks against the input and output descriptors. Nothing here
//! touches pixel data or the accelerator.

mod checks;
mod sizing;

pub use checks::{Check, CheckList, Contract, Role};
pub use sizing::resolve_sizing;

use crate::image_pipeline::common::error::Result;

/// Runs the standard checks in order, stopping at the first failure.
pub fn validate(contract: &Contract<'_>) -> Result<()> {
    CheckList::standard().run(contract)
}

//! Buffer descriptors and borrowed host views
//!
//! A descriptor is the geometric contract of an array (per-axis min, extent and
//! stride plus element size). Views pair a descriptor with caller-owned storage
//! for the duration of one call.

pub mod descriptor;
mod view;

pub use descriptor::{BufferDescriptor, Dim, Element, MAX_DIMS};
pub use view::{HostView, HostViewMut};

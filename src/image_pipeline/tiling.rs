//! Tile planning
//!
//! Splits an image into halo-padded tiles sized to the accelerator's fixed
//! input window. Tile counts come from the output extents; input spans are
//! clamped so no tile reads outside the input image.

pub mod geometry;
pub mod plan;

pub use geometry::{TileGeometry, DEMOSAIC_BORDER};
pub use plan::{Tile, TilePlan};

use crate::image_pipeline::common::error::{OffloadError, Result};
use crate::image_pipeline::packing::layout;

/// Extra input pixels, per axis, the kernel reads past the output footprint.
pub const DEMOSAIC_BORDER: i32 = 2;

/// The accelerator's fixed tile window and stencil halo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    tile_size: [i32; 2],
    stencil: [i32; 2],
}

impl TileGeometry {
    /// Window the shipped kernel binary was synthesised for.
    pub const ACCELERATOR: TileGeometry = TileGeometry {
        tile_size: [128, 128],
        stencil: [23, 19],
    };

    /// Checked constructor for non-default windows.
    ///
    /// Rejects windows that make no forward progress, whose halo cannot hold the
    /// demosaic border, or whose output region spills past the per-tile output
    /// slots of the wire format.
    pub fn new(tile_size: [i32; 2], stencil: [i32; 2]) -> Result<Self> {
        for axis in 0..2 {
            if tile_size[axis] <= 0 {
                return Err(OffloadError::ConstraintViolated {
                    variable: format!("tile_size.{axis}"),
                    actual: tile_size[axis] as i64,
                    expected: 1,
                });
            }
            if stencil[axis] < DEMOSAIC_BORDER + 1 {
                return Err(OffloadError::ConstraintViolated {
                    variable: format!("stencil.{axis}"),
                    actual: stencil[axis] as i64,
                    expected: (DEMOSAIC_BORDER + 1) as i64,
                });
            }
            let step = tile_size[axis] - stencil[axis] + 1;
            if step <= 0 {
                return Err(OffloadError::ConstraintViolated {
                    variable: format!("tile_step.{axis}"),
                    actual: step as i64,
                    expected: 1,
                });
            }
        }

        let geometry = Self { tile_size, stencil };
        let last_pixel = (geometry.step(1) - 1) * tile_size[0] + geometry.step(0) - 1;
        let last_slot = layout::slot_in_tile(last_pixel as usize, layout::OUTPUT_CHANNELS - 1);
        if last_slot >= geometry.output_tile_len() {
            return Err(OffloadError::ConstraintViolated {
                variable: "output_tile_slots".to_string(),
                actual: last_slot as i64,
                expected: geometry.output_tile_len() as i64 - 1,
            });
        }

        Ok(geometry)
    }

    pub fn tile_size(&self, axis: usize) -> i32 {
        self.tile_size[axis]
    }

    pub fn stencil(&self, axis: usize) -> i32 {
        self.stencil[axis]
    }

    /// Distance between consecutive tile origins: `tile_size - stencil + 1`.
    pub fn step(&self, axis: usize) -> i32 {
        self.tile_size[axis] - self.stencil[axis] + 1
    }

    /// Elements in one packed input tile.
    pub fn input_tile_len(&self) -> usize {
        self.tile_size[0] as usize * self.tile_size[1] as usize
    }

    /// Bytes in one tile of the channel-interleaved output.
    pub fn output_tile_len(&self) -> usize {
        layout::tile_slots(self.input_tile_len())
    }
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self::ACCELERATOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerator_window() {
        let g = TileGeometry::ACCELERATOR;
        assert_eq!(g.step(0), 106);
        assert_eq!(g.step(1), 110);
        assert_eq!(g.input_tile_len(), 128 * 128);
        assert_eq!(g.output_tile_len(), 128 * 128 / 21 * 64);
        assert_eq!(TileGeometry::new([128, 128], [23, 19]), Ok(g));
    }

    #[test]
    fn test_rejects_window_without_progress() {
        let err = TileGeometry::new([8, 8], [9, 4]).unwrap_err();
        assert!(matches!(err, OffloadError::ConstraintViolated { ref variable, .. } if variable == "tile_step.0"));
    }

    #[test]
    fn test_rejects_halo_smaller_than_border() {
        let err = TileGeometry::new([16, 16], [5, 2]).unwrap_err();
        assert!(matches!(err, OffloadError::ConstraintViolated { ref variable, .. } if variable == "stencil.1"));
    }

    #[test]
    fn test_rejects_output_spilling_past_slots() {
        // A window too small for a single 21-pixel block spills its last pixel past the slots.
        let err = TileGeometry::new([4, 4], [3, 3]).unwrap_err();
        assert!(matches!(err, OffloadError::ConstraintViolated { ref variable, .. } if variable == "output_tile_slots"));
    }

    #[test]
    fn test_small_window_is_accepted() {
        let g = TileGeometry::new([16, 12], [5, 4]).unwrap();
        assert_eq!(g.step(0), 12);
        assert_eq!(g.step(1), 9);
    }
}

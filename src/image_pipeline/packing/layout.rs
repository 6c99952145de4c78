//! Output wire format of the accelerator
//!
//! The kernel writes 21 pixels per 64-byte block, 3 channels each, the
//! remaining 1 byte of every block unused. Pixel `n` of a tile (scanline order,
//! `n = j * tile_width + i`) stores channel `c` at
//! `(n / 21) * 64 + (n % 21) * 3 + c` within the tile.

use crate::image_pipeline::tiling::TileGeometry;

pub const OUTPUT_BLOCK_PIXELS: usize = 21;
pub const OUTPUT_BLOCK_SLOTS: usize = 64;
pub const OUTPUT_CHANNELS: usize = 3;

/// Bytes one tile occupies in the output buffer.
pub const fn tile_slots(tile_pixels: usize) -> usize {
    tile_pixels / OUTPUT_BLOCK_PIXELS * OUTPUT_BLOCK_SLOTS
}

/// Offset of a pixel's channel inside its tile.
pub const fn slot_in_tile(pixel: usize, channel: usize) -> usize {
    (pixel / OUTPUT_BLOCK_PIXELS) * OUTPUT_BLOCK_SLOTS
        + (pixel % OUTPUT_BLOCK_PIXELS) * OUTPUT_CHANNELS
        + channel
}

/// Offset in the whole output buffer of channel `channel` at local `(i, j)` of tile `tile_index`.
pub fn output_offset(geometry: &TileGeometry, tile_index: usize, i: usize, j: usize, channel: usize) -> usize {
    let tile_width = geometry.tile_size(0) as usize;
    tile_index * geometry.output_tile_len() + slot_in_tile(j * tile_width + i, channel)
}

/// Offset in the packed input buffer of local `(i, j)` of tile `tile_index`.
pub fn input_offset(geometry: &TileGeometry, tile_index: usize, i: usize, j: usize) -> usize {
    tile_index * geometry.input_tile_len() + j * geometry.tile_size(0) as usize + i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_addressing() {
        assert_eq!(slot_in_tile(0, 0), 0);
        assert_eq!(slot_in_tile(0, 2), 2);
        assert_eq!(slot_in_tile(20, 2), 62);
        assert_eq!(slot_in_tile(21, 0), 64);
        assert_eq!(slot_in_tile(43, 1), 128 + 3 + 1);
    }

    #[test]
    fn test_offsets_for_accelerator_window() {
        let g = TileGeometry::ACCELERATOR;
        let per_tile = 128 * 128 / 21 * 64;
        // (i, j) = (5, 1) is pixel 133 = block 6, position 7.
        assert_eq!(output_offset(&g, 2, 5, 1, 2), 2 * per_tile + 6 * 64 + 7 * 3 + 2);
        assert_eq!(input_offset(&g, 3, 5, 1), 3 * 128 * 128 + 128 + 5);
    }

    #[test]
    fn test_blocks_never_share_slots() {
        let mut seen = std::collections::HashSet::new();
        for pixel in 0..(OUTPUT_BLOCK_PIXELS * 4) {
            for channel in 0..OUTPUT_CHANNELS {
                assert!(seen.insert(slot_in_tile(pixel, channel)));
            }
        }
        assert!(seen.iter().all(|slot| slot % OUTPUT_BLOCK_SLOTS != OUTPUT_BLOCK_SLOTS - 1));
    }
}

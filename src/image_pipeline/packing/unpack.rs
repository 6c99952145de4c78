use tracing::debug;

use crate::image_pipeline::buffer::HostViewMut;
use crate::image_pipeline::common::error::{OffloadError, Result};
use crate::image_pipeline::packing::layout::{self, OUTPUT_CHANNELS};
use crate::image_pipeline::tiling::TilePlan;

/// Scatters the accelerator's channel-interleaved tiles back into the output image.
///
/// Only each tile's output span is copied; the halo and block padding are dropped.
pub fn unpack_output(plan: &TilePlan, tiled: &[u8], output: &mut HostViewMut<'_, u8>) -> Result<()> {
    let desc = *output.descriptor();
    if tiled.len() < plan.packed_output_len() {
        return Err(OffloadError::HostBufferTooSmall {
            buffer: "output tiles",
            required: plan.packed_output_len() as i64,
            actual: tiled.len(),
        });
    }
    let dest = output.data_mut().ok_or(OffloadError::HostBufferTooSmall {
        buffer: "output",
        required: desc.element_count(),
        actual: 0,
    })?;

    let tile_width = plan.tile_size_dim0() as usize;
    let tile_slots = plan.geometry().output_tile_len();
    let strides = [desc.stride(0) as i64, desc.stride(1) as i64, desc.stride(2) as i64];

    for tile in plan.tiles() {
        let block = &tiled[tile.index * tile_slots..][..tile_slots];
        for k in 0..OUTPUT_CHANNELS {
            for j in 0..tile.output_span[1] as usize {
                let q = (tile.origin[1] as usize + j) as i64;
                for i in 0..tile.output_span[0] as usize {
                    let p = (tile.origin[0] as usize + i) as i64;
                    let value = block[layout::slot_in_tile(j * tile_width + i, k)];
                    let offset = p * strides[0] + q * strides[1] + k as i64 * strides[2];
                    dest[offset as usize] = value;
                }
            }
        }
    }

    debug!(tiles = plan.total_tiles(), "Unpacked output tiles");
    Ok(())
}

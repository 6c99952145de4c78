use rayon::prelude::*;
use tracing::debug;

use crate::image_pipeline::buffer::{Element, HostView};
use crate::image_pipeline::common::error::{OffloadError, Result};
use crate::image_pipeline::tiling::{Tile, TilePlan};

/// Zero-filled staging buffer; reports `OutOfMemory` instead of aborting.
pub fn alloc_zeroed<T: Element>(len: usize, buffer: &'static str) -> Result<Vec<T>> {
    let mut staging = Vec::new();
    staging.try_reserve_exact(len).map_err(|_| OffloadError::OutOfMemory {
        buffer,
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    staging.resize(len, T::default());
    Ok(staging)
}

/// Little-endian byte image of a `u16` staging buffer, as transferred to the device.
pub fn encode_le(values: &[u16], buffer: &'static str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(values.len() * 2).map_err(|_| OffloadError::OutOfMemory {
        buffer,
        bytes: values.len() * 2,
    })?;
    bytes.extend(values.iter().flat_map(|v| v.to_le_bytes()));
    Ok(bytes)
}

/// Copies the input image into halo-padded tiles of the accelerator's input window.
///
/// Tile `(tx, ty)` occupies `tile_size0 * tile_size1` consecutive elements,
/// scanline order; positions outside the tile's input span stay zero.
pub fn pack_input(plan: &TilePlan, input: &HostView<'_, u16>, parallel: bool) -> Result<Vec<u16>> {
    let desc = input.descriptor();
    let source = input.data().ok_or(OffloadError::HostBufferTooSmall {
        buffer: "input",
        required: desc.element_count(),
        actual: 0,
    })?;

    let mut packed = alloc_zeroed::<u16>(plan.packed_input_len(), "input tiles")?;
    let tile_len = plan.geometry().input_tile_len();
    let strides = [desc.stride(0) as i64, desc.stride(1) as i64];
    let tiles_x = plan.tile_count_dim0().max(1) as usize;

    let fill = |(index, chunk): (usize, &mut [u16])| {
        let tile = plan.tile((index % tiles_x) as i32, (index / tiles_x) as i32);
        pack_tile(&tile, plan.tile_size_dim0() as usize, strides, source, chunk);
    };

    if parallel {
        packed.par_chunks_mut(tile_len).enumerate().for_each(fill);
    } else {
        packed.chunks_mut(tile_len).enumerate().for_each(fill);
    }

    debug!(tiles = plan.total_tiles(), elements = packed.len(), "Packed input tiles");
    Ok(packed)
}

fn pack_tile(tile: &Tile, tile_width: usize, strides: [i64; 2], source: &[u16], dest: &mut [u16]) {
    let [width, height] = tile.input_span;
    let [origin_x, origin_y] = tile.origin;

    for j in 0..height {
        let q = (origin_y + j) as i64;
        let row = &mut dest[j as usize * tile_width..][..width as usize];
        let base = origin_x as i64 * strides[0] + q * strides[1];

        if strides[0] == 1 {
            let start = base as usize;
            row.copy_from_slice(&source[start..start + width as usize]);
        } else {
            for (i, slot) in row.iter_mut().enumerate() {
                *slot = source[(base + i as i64 * strides[0]) as usize];
            }
        }
    }
}

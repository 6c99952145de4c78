use tracing::debug;

use crate::image_pipeline::buffer::{BufferDescriptor, Element};
use crate::image_pipeline::packing::layout::OUTPUT_CHANNELS;
use crate::image_pipeline::tiling::DEMOSAIC_BORDER;

/// Rewrites unallocated descriptors into the dense shapes the call requires.
///
/// Returns `true` when either buffer was unallocated; the call is then a
/// sizing query and must stop after returning the rewritten descriptors.
pub fn resolve_sizing(input: &mut BufferDescriptor, output: &mut BufferDescriptor) -> bool {
    let query = input.is_unallocated() || output.is_unallocated();

    if output.is_unallocated() {
        let mut axes = [(output.min(0), output.extent(0)), (output.min(1), output.extent(1))];
        if axes[0].1 == 0 && axes[1].1 == 0 && input.is_host_resident() {
            for (axis, (min, extent)) in axes.iter_mut().enumerate() {
                *min = input.min(axis);
                *extent = (input.extent(axis) - DEMOSAIC_BORDER).max(0);
            }
        }
        output.rewrite_dense(
            u8::ELEM_SIZE,
            &[axes[0], axes[1], (0, OUTPUT_CHANNELS as i32)],
        );
        debug!(width = axes[0].1, height = axes[1].1, "Sized output buffer");
    }

    if input.is_unallocated() {
        let axes = [0, 1].map(|axis| (output.min(axis), output.extent(axis) + DEMOSAIC_BORDER));
        input.rewrite_dense(u16::ELEM_SIZE, &axes);
        debug!(width = axes[0].1, height = axes[1].1, "Sized input buffer");
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::buffer::Dim;

    #[test]
    fn test_unallocated_input_follows_output() {
        let mut output = BufferDescriptor::interleaved::<u8>(6, 4, 3).with_host_resident(true);
        let mut input = BufferDescriptor::contiguous(2, &[0, 0]);

        assert!(resolve_sizing(&mut input, &mut output));
        assert_eq!(input.dims(), &[Dim::new(0, 8, 1), Dim::new(0, 6, 8)]);
        assert_eq!(input.elem_size(), 2);
        assert_eq!(output, BufferDescriptor::interleaved::<u8>(6, 4, 3).with_host_resident(true));
    }

    #[test]
    fn test_unallocated_output_is_made_planar() {
        let mut output = BufferDescriptor::interleaved::<u8>(5, 3, 3).with_elem_size(4);
        let mut input = BufferDescriptor::contiguous(2, &[7, 5]).with_host_resident(true);

        assert!(resolve_sizing(&mut input, &mut output));
        assert_eq!(
            output.dims(),
            &[Dim::new(0, 5, 1), Dim::new(0, 3, 5), Dim::new(0, 3, 15)]
        );
        assert_eq!(output.elem_size(), 1);
    }

    #[test]
    fn test_empty_output_request_takes_input_extents() {
        let mut output = BufferDescriptor::contiguous(1, &[0, 0, 3]);
        let mut input = BufferDescriptor::contiguous(2, &[10, 8]).with_host_resident(true);

        assert!(resolve_sizing(&mut input, &mut output));
        assert_eq!((output.extent(0), output.extent(1), output.extent(2)), (8, 6, 3));
    }

    #[test]
    fn test_both_unallocated() {
        let mut output = BufferDescriptor::contiguous(1, &[4, 4, 3]);
        let mut input = BufferDescriptor::contiguous(2, &[0, 0]);

        assert!(resolve_sizing(&mut input, &mut output));
        assert_eq!((input.extent(0), input.extent(1)), (6, 6));
    }

    #[test]
    fn test_allocated_buffers_are_untouched() {
        let mut output = BufferDescriptor::interleaved::<u8>(2, 2, 3).with_host_resident(true);
        let mut input = BufferDescriptor::contiguous(2, &[4, 4]).with_host_resident(true);
        let before = (input, output);

        assert!(!resolve_sizing(&mut input, &mut output));
        assert_eq!((input, output), before);
    }
}

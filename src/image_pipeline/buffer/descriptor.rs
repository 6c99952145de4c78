//! Geometric buffer contract

/// Maximum number of axes a descriptor carries.
pub const MAX_DIMS: usize = 4;

/// One axis of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dim {
    pub min: i32,
    pub extent: i32,
    pub stride: i32,
}

impl Dim {
    pub const fn new(min: i32, extent: i32, stride: i32) -> Self {
        Self { min, extent, stride }
    }

    /// Last coordinate covered by this axis.
    pub fn max(&self) -> i64 {
        self.min as i64 + self.extent as i64 - 1
    }
}

/// Element types a buffer may hold, with the width the validator expects.
pub trait Element: Copy + Default + Send + Sync + 'static {
    const ELEM_SIZE: i32;
    const TYPE_NAME: &'static str;
}

impl Element for u8 {
    const ELEM_SIZE: i32 = 1;
    const TYPE_NAME: &'static str = "uint8";
}

impl Element for u16 {
    const ELEM_SIZE: i32 = 2;
    const TYPE_NAME: &'static str = "uint16";
}

/// Shape of an up-to-4-D array view.
///
/// Axes past `rank` read back as zero. The element addressed by local
/// coordinate `(p, q, ..)` sits at `p*stride0 + q*stride1 + ..` from the start of
/// the host storage, which itself corresponds to `(min0, min1, ..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    dims: [Dim; MAX_DIMS],
    rank: usize,
    elem_size: i32,
    host_resident: bool,
}

impl BufferDescriptor {
    /// Builds a descriptor from explicit axes.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_DIMS`] axes are given or an extent is negative.
    pub fn new(elem_size: i32, axes: &[Dim]) -> Self {
        assert!(axes.len() <= MAX_DIMS, "at most {MAX_DIMS} axes are supported");
        assert!(axes.iter().all(|d| d.extent >= 0), "extents must be non-negative");

        let mut dims = [Dim::default(); MAX_DIMS];
        dims[..axes.len()].copy_from_slice(axes);
        Self {
            dims,
            rank: axes.len(),
            elem_size,
            host_resident: false,
        }
    }

    /// Densely packed layout with the first axis fastest and all mins at zero.
    pub fn contiguous(elem_size: i32, extents: &[i32]) -> Self {
        let mut axes = [Dim::default(); MAX_DIMS];
        let mut stride = 1i32;
        for (axis, &extent) in extents.iter().enumerate().take(MAX_DIMS) {
            axes[axis] = Dim::new(0, extent, stride);
            stride = stride.saturating_mul(extent);
        }
        Self::new(elem_size, &axes[..extents.len().min(MAX_DIMS)])
    }

    /// Contiguous descriptor for element type `T`.
    pub fn for_element<T: Element>(extents: &[i32]) -> Self {
        Self::contiguous(T::ELEM_SIZE, extents)
    }

    /// Interleaved `x, y, channel` layout: channels adjacent, then columns, then rows.
    pub fn interleaved<T: Element>(width: i32, height: i32, channels: i32) -> Self {
        Self::new(
            T::ELEM_SIZE,
            &[
                Dim::new(0, width, channels),
                Dim::new(0, height, width.saturating_mul(channels)),
                Dim::new(0, channels, 1),
            ],
        )
    }

    pub fn with_min(mut self, axis: usize, min: i32) -> Self {
        if axis < self.rank {
            self.dims[axis].min = min;
        }
        self
    }

    pub fn with_elem_size(mut self, elem_size: i32) -> Self {
        self.elem_size = elem_size;
        self
    }

    pub(crate) fn with_host_resident(mut self, host_resident: bool) -> Self {
        self.host_resident = host_resident;
        self
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn elem_size(&self) -> i32 {
        self.elem_size
    }

    /// True when host storage is attached; otherwise the descriptor is a sizing request.
    pub fn is_host_resident(&self) -> bool {
        self.host_resident
    }

    pub fn is_unallocated(&self) -> bool {
        !self.host_resident
    }

    pub fn dim(&self, axis: usize) -> Dim {
        if axis < self.rank {
            self.dims[axis]
        } else {
            Dim::default()
        }
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims[..self.rank]
    }

    pub fn min(&self, axis: usize) -> i32 {
        self.dim(axis).min
    }

    pub fn extent(&self, axis: usize) -> i32 {
        self.dim(axis).extent
    }

    pub fn stride(&self, axis: usize) -> i32 {
        self.dim(axis).stride
    }

    /// Product of all extents, in 64-bit so it cannot overflow for 4 axes of `i32`.
    pub fn element_count(&self) -> i64 {
        self.dims().iter().map(|d| d.extent as i64).product()
    }

    /// Lowest and highest element offsets the descriptor addresses, or `None` when empty.
    pub fn footprint(&self) -> Option<(i64, i64)> {
        if self.dims().iter().any(|d| d.extent == 0) {
            return None;
        }
        let mut lo = 0i64;
        let mut hi = 0i64;
        for d in self.dims() {
            let reach = (d.extent as i64 - 1) * d.stride as i64;
            if reach < 0 {
                lo += reach;
            } else {
                hi += reach;
            }
        }
        Some((lo, hi))
    }

    /// Element offset of a local coordinate, or `None` if any component is outside its extent.
    pub fn offset_of(&self, coords: &[i32]) -> Option<usize> {
        if coords.len() != self.rank {
            return None;
        }
        let mut offset = 0i64;
        for (d, &c) in self.dims().iter().zip(coords) {
            if c < 0 || c >= d.extent {
                return None;
            }
            offset += c as i64 * d.stride as i64;
        }
        usize::try_from(offset).ok()
    }

    /// Rewrites the descriptor into the dense layout for the given mins and extents.
    ///
    /// Used by the validator when answering a sizing request; never applied to
    /// a host-resident buffer.
    pub(crate) fn rewrite_dense(&mut self, elem_size: i32, axes: &[(i32, i32)]) {
        debug_assert!(!self.host_resident);
        let mut dims = [Dim::default(); MAX_DIMS];
        let mut stride = 1i32;
        for (axis, &(min, extent)) in axes.iter().enumerate().take(MAX_DIMS) {
            dims[axis] = Dim::new(min, extent.max(0), stride);
            stride = stride.saturating_mul(extent.max(0));
        }
        self.dims = dims;
        self.rank = axes.len().min(MAX_DIMS);
        self.elem_size = elem_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_strides() {
        let desc = BufferDescriptor::contiguous(2, &[7, 5]);
        assert_eq!(desc.rank(), 2);
        assert_eq!(desc.dim(0), Dim::new(0, 7, 1));
        assert_eq!(desc.dim(1), Dim::new(0, 5, 7));
        assert_eq!(desc.element_count(), 35);
        assert!(desc.is_unallocated());
    }

    #[test]
    fn test_axes_past_rank_read_as_zero() {
        let desc = BufferDescriptor::contiguous(1, &[3, 3]);
        assert_eq!(desc.dim(2), Dim::default());
        assert_eq!(desc.dim(17), Dim::default());
        assert_eq!(desc.extent(3), 0);
    }

    #[test]
    fn test_interleaved_layout() {
        let desc = BufferDescriptor::interleaved::<u8>(4, 2, 3);
        assert_eq!(desc.offset_of(&[0, 0, 2]), Some(2));
        assert_eq!(desc.offset_of(&[1, 0, 0]), Some(3));
        assert_eq!(desc.offset_of(&[0, 1, 0]), Some(12));
        assert_eq!(desc.offset_of(&[4, 0, 0]), None);
        assert_eq!(desc.footprint(), Some((0, 23)));
    }

    #[test]
    fn test_footprint_with_negative_stride() {
        let desc = BufferDescriptor::new(1, &[Dim::new(0, 4, 1), Dim::new(0, 3, -4)]);
        assert_eq!(desc.footprint(), Some((-8, 3)));
    }

    #[test]
    fn test_footprint_of_empty_buffer() {
        let desc = BufferDescriptor::contiguous(1, &[0, 8]);
        assert_eq!(desc.footprint(), None);
        assert_eq!(desc.element_count(), 0);
    }

    #[test]
    fn test_rewrite_dense() {
        let mut desc = BufferDescriptor::new(4, &[Dim::new(3, 10, 9), Dim::new(1, 2, 99)]);
        desc.rewrite_dense(2, &[(3, 12), (1, 4)]);
        assert_eq!(desc.dims(), &[Dim::new(3, 12, 1), Dim::new(1, 4, 12)]);
        assert_eq!(desc.elem_size(), 2);
    }
}

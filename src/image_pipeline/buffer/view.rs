use crate::image_pipeline::buffer::descriptor::{BufferDescriptor, Element};

/// Read-only view of caller storage shaped by a descriptor.
#[derive(Debug)]
pub struct HostView<'a, T: Element> {
    desc: BufferDescriptor,
    data: Option<&'a [T]>,
}

impl<'a, T: Element> HostView<'a, T> {
    pub fn new(data: &'a [T], desc: BufferDescriptor) -> Self {
        Self {
            desc: desc.with_host_resident(true),
            data: Some(data),
        }
    }

    /// A sizing request: no storage, the validator fills in the descriptor.
    pub fn unallocated(desc: BufferDescriptor) -> Self {
        Self {
            desc: desc.with_host_resident(false),
            data: None,
        }
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.desc
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut BufferDescriptor {
        &mut self.desc
    }

    pub fn data(&self) -> Option<&'a [T]> {
        self.data
    }

    /// Element at a local coordinate; `None` outside the descriptor or the storage.
    pub fn get(&self, coords: &[i32]) -> Option<T> {
        let offset = self.desc.offset_of(coords)?;
        self.data?.get(offset).copied()
    }
}

/// Writable view of caller storage shaped by a descriptor.
#[derive(Debug)]
pub struct HostViewMut<'a, T: Element> {
    desc: BufferDescriptor,
    data: Option<&'a mut [T]>,
}

impl<'a, T: Element> HostViewMut<'a, T> {
    pub fn new(data: &'a mut [T], desc: BufferDescriptor) -> Self {
        Self {
            desc: desc.with_host_resident(true),
            data: Some(data),
        }
    }

    pub fn unallocated(desc: BufferDescriptor) -> Self {
        Self {
            desc: desc.with_host_resident(false),
            data: None,
        }
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.desc
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut BufferDescriptor {
        &mut self.desc
    }

    pub fn data(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut [T]> {
        self.data.as_deref_mut()
    }

    pub fn get(&self, coords: &[i32]) -> Option<T> {
        let offset = self.desc.offset_of(coords)?;
        self.data.as_deref()?.get(offset).copied()
    }

    /// Stores `value` at a local coordinate; returns false if it is not addressable.
    pub fn set(&mut self, coords: &[i32], value: T) -> bool {
        let Some(offset) = self.desc.offset_of(coords) else {
            return false;
        };
        match self.data.as_deref_mut().and_then(|d| d.get_mut(offset)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_track_residency() {
        let pixels = [1u16, 2, 3, 4];
        let view = HostView::new(&pixels, BufferDescriptor::for_element::<u16>(&[2, 2]));
        assert!(view.descriptor().is_host_resident());
        assert_eq!(view.get(&[1, 1]), Some(4));
        assert_eq!(view.get(&[2, 0]), None);

        let sizing = HostView::<u16>::unallocated(BufferDescriptor::for_element::<u16>(&[2, 2]));
        assert!(sizing.descriptor().is_unallocated());
        assert_eq!(sizing.get(&[0, 0]), None);
    }

    #[test]
    fn test_set_is_bounds_checked() {
        let mut storage = [0u8; 6];
        let mut view = HostViewMut::new(&mut storage, BufferDescriptor::interleaved::<u8>(2, 1, 3));
        assert!(view.set(&[1, 0, 2], 9));
        assert!(!view.set(&[2, 0, 0], 9));
        assert_eq!(view.get(&[1, 0, 2]), Some(9));
        drop(view);
        assert_eq!(storage, [0, 0, 0, 0, 0, 9]);
    }
}

use tracing::trace;

use crate::image_pipeline::accelerator::runtime::{AcceleratorRuntime, BufferMode};
use crate::image_pipeline::common::error::{OffloadError, Result};

/// Device allocation released through its runtime when dropped, on every exit path.
pub struct DeviceBuffer<'r, R: AcceleratorRuntime> {
    runtime: &'r R,
    device: &'r R::Device,
    buffer: Option<R::Buffer>,
    label: &'static str,
}

impl<'r, R: AcceleratorRuntime> DeviceBuffer<'r, R> {
    pub fn allocate(
        runtime: &'r R,
        device: &'r R::Device,
        label: &'static str,
        size: usize,
        mode: BufferMode,
    ) -> Result<Self> {
        let buffer = runtime.create_buffer(device, size, mode).map_err(|e| match e {
            OffloadError::OutOfMemory { bytes, .. } => OffloadError::OutOfMemory { buffer: label, bytes },
            other => other,
        })?;
        trace!(buffer = label, size, ?mode, "Allocated device buffer");
        Ok(Self {
            runtime,
            device,
            buffer: Some(buffer),
            label,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn get(&self) -> &R::Buffer {
        match &self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("device buffer {} used after release", self.label),
        }
    }

    pub fn get_mut(&mut self) -> &mut R::Buffer {
        match &mut self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("device buffer {} used after release", self.label),
        }
    }

    /// Blocking host to device copy.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let (runtime, device, label) = (self.runtime, self.device, self.label);
        runtime.write(device, self.get_mut(), data).map_err(|e| relabel(e, label))
    }

    /// Blocking device to host copy.
    pub fn read(&self, out: &mut [u8]) -> Result<()> {
        self.runtime
            .read(self.device, self.get(), out)
            .map_err(|e| relabel(e, self.label))
    }
}

fn relabel(err: OffloadError, label: &'static str) -> OffloadError {
    match err {
        OffloadError::TransferFailed { reason, .. } => OffloadError::TransferFailed { buffer: label, reason },
        other => other,
    }
}

impl<R: AcceleratorRuntime> Drop for DeviceBuffer<'_, R> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.runtime.release_buffer(self.device, buffer);
            trace!(buffer = self.label, "Released device buffer");
        }
    }
}

use std::path::Path;

use crate::image_pipeline::common::error::{OffloadError, Result};

/// Entry point symbol of the kernel inside the accelerator binary.
pub const KERNEL_NAME: &str = "curved_kernel";

/// Host access pattern of a device allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// The kernel only reads it; the host writes it before launch.
    ReadOnly,
    /// The kernel only writes it; the host reads it after completion.
    WriteOnly,
}

/// Arguments of one kernel launch, in the kernel's parameter order.
pub struct KernelArgs<'a, B> {
    pub matrix: &'a B,
    pub curve: &'a B,
    pub output: &'a mut B,
    pub input: &'a B,
    pub tile_count: [i32; 2],
    pub output_extent: [i32; 2],
    pub output_min: [i32; 2],
}

/// Narrow interface to the platform that owns the accelerator.
///
/// Every call blocks until the device has finished. Implementations report
/// failures with the matching [`OffloadError`] runtime variant and never retry.
pub trait AcceleratorRuntime {
    type Device;
    type Program;
    type Buffer;

    fn find_device(&self, vendor: &str, device_name: &str) -> Result<Self::Device>;

    /// Reads the precompiled kernel binary.
    fn load_binary(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| OffloadError::BinaryLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn build_program(&self, device: &Self::Device, binary: &[u8], kernel_name: &str) -> Result<Self::Program>;

    fn create_buffer(&self, device: &Self::Device, size: usize, mode: BufferMode) -> Result<Self::Buffer>;

    fn write(&self, device: &Self::Device, buffer: &mut Self::Buffer, data: &[u8]) -> Result<()>;

    fn enqueue_kernel(
        &self,
        device: &Self::Device,
        program: &Self::Program,
        args: KernelArgs<'_, Self::Buffer>,
    ) -> Result<()>;

    fn read(&self, device: &Self::Device, buffer: &Self::Buffer, out: &mut [u8]) -> Result<()>;

    fn release_buffer(&self, device: &Self::Device, buffer: Self::Buffer);
}

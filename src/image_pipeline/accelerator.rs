//! Accelerator runtimes
//!
//! The coordinator only talks to the accelerator through [`AcceleratorRuntime`].
//! A host emulation of the kernel is always available; the CUDA driver runtime
//! is compiled on Jetson targets only.

#[cfg(jetson_cuda)]
pub mod cuda_runtime;
mod runtime;
mod scoped;
pub mod software;

// Placeholder when NOT on Jetson
#[cfg(not(jetson_cuda))]
pub struct CudaRuntime;

#[cfg(not(jetson_cuda))]
impl CudaRuntime {
    pub fn new() -> crate::image_pipeline::Result<Self> {
        Err(crate::image_pipeline::OffloadError::DeviceNotFound {
            vendor: "NVIDIA".to_string(),
            device: "CUDA runtime is not available on this platform".to_string(),
        })
    }
}

#[cfg(jetson_cuda)]
pub use cuda_runtime::CudaRuntime;
pub use runtime::{AcceleratorRuntime, BufferMode, KernelArgs, KERNEL_NAME};
pub use scoped::DeviceBuffer;
pub use software::SoftwareAccelerator;

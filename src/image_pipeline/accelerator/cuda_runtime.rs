use cudarc::driver::safe::*;
use cudarc::nvrtc::Ptx;
use std::sync::Arc;
use tracing::{debug, info};

use crate::image_pipeline::accelerator::runtime::{AcceleratorRuntime, BufferMode, KernelArgs};
use crate::image_pipeline::common::error::{OffloadError, Result};

/// Threads per tile; the kernel strides over its tile with this block.
const TILE_THREADS: (u32, u32, u32) = (32, 8, 1);

/// CUDA driver runtime for Jetson boards. The kernel binary is PTX text.
pub struct CudaRuntime;

pub struct CudaDevice {
    ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
}

pub struct CudaProgram {
    _module: Arc<CudaModule>,
    function: CudaFunction,
}

impl CudaRuntime {
    pub fn new() -> Result<Self> {
        let count = CudaContext::device_count().map_err(|e| OffloadError::DeviceNotFound {
            vendor: "NVIDIA".to_string(),
            device: e.to_string(),
        })?;
        if count <= 0 {
            return Err(OffloadError::DeviceNotFound {
                vendor: "NVIDIA".to_string(),
                device: "no CUDA device".to_string(),
            });
        }
        Ok(Self)
    }
}

impl AcceleratorRuntime for CudaRuntime {
    type Device = CudaDevice;
    type Program = CudaProgram;
    type Buffer = CudaSlice<u8>;

    fn find_device(&self, vendor: &str, device_name: &str) -> Result<Self::Device> {
        let not_found = || OffloadError::DeviceNotFound {
            vendor: vendor.to_string(),
            device: device_name.to_string(),
        };
        if !vendor.eq_ignore_ascii_case("nvidia") {
            return Err(not_found());
        }

        let count = CudaContext::device_count().map_err(|_| not_found())?;
        for ordinal in 0..count.max(0) as usize {
            let ctx = CudaContext::new(ordinal).map_err(|_| not_found())?;
            let name = ctx.name().map_err(|_| not_found())?;
            debug!(ordinal, name = %name, "Found CUDA device");
            if device_name.is_empty() || name.contains(device_name) {
                info!(ordinal, name = %name, "Selected CUDA device");
                let stream = ctx.default_stream();
                return Ok(CudaDevice { ctx, stream });
            }
        }
        Err(not_found())
    }

    fn build_program(&self, device: &Self::Device, binary: &[u8], kernel_name: &str) -> Result<Self::Program> {
        let ptx = String::from_utf8(binary.to_vec())
            .map_err(|e| OffloadError::BuildFailed(format!("kernel binary is not PTX text: {e}")))?;
        let module = device
            .ctx
            .load_module(Ptx::from_src(ptx))
            .map_err(|e| OffloadError::BuildFailed(e.to_string()))?;
        let function = module
            .load_function(kernel_name)
            .map_err(|e| OffloadError::BuildFailed(format!("{kernel_name}: {e}")))?;
        Ok(CudaProgram {
            _module: module,
            function,
        })
    }

    fn create_buffer(&self, device: &Self::Device, size: usize, _mode: BufferMode) -> Result<Self::Buffer> {
        device
            .stream
            .alloc_zeros::<u8>(size)
            .map_err(|_| OffloadError::OutOfMemory { buffer: "device", bytes: size })
    }

    fn write(&self, device: &Self::Device, buffer: &mut Self::Buffer, data: &[u8]) -> Result<()> {
        let transfer_failed = |e: DriverError| OffloadError::TransferFailed {
            buffer: "device",
            reason: e.to_string(),
        };
        device.stream.memcpy_htod(data, buffer).map_err(transfer_failed)?;
        device.stream.synchronize().map_err(transfer_failed)
    }

    fn enqueue_kernel(
        &self,
        device: &Self::Device,
        program: &Self::Program,
        args: KernelArgs<'_, Self::Buffer>,
    ) -> Result<()> {
        let [tiles_x, tiles_y] = args.tile_count;
        let mut launch_args = device.stream.launch_builder(&program.function);
        launch_args.arg(args.matrix);
        launch_args.arg(args.curve);
        launch_args.arg(args.output);
        launch_args.arg(args.input);
        launch_args.arg(&args.tile_count[0]);
        launch_args.arg(&args.tile_count[1]);
        launch_args.arg(&args.output_extent[0]);
        launch_args.arg(&args.output_extent[1]);
        launch_args.arg(&args.output_min[0]);
        launch_args.arg(&args.output_min[1]);

        let cfg = LaunchConfig {
            grid_dim: (tiles_x.max(1) as u32, tiles_y.max(1) as u32, 1),
            block_dim: TILE_THREADS,
            shared_mem_bytes: 0,
        };
        unsafe { launch_args.launch(cfg) }.map_err(|e| OffloadError::ExecutionFailed(e.to_string()))?;
        device
            .stream
            .synchronize()
            .map_err(|e| OffloadError::ExecutionFailed(e.to_string()))
    }

    fn read(&self, device: &Self::Device, buffer: &Self::Buffer, out: &mut [u8]) -> Result<()> {
        let transfer_failed = |e: DriverError| OffloadError::TransferFailed {
            buffer: "device",
            reason: e.to_string(),
        };
        device.stream.memcpy_dtoh(buffer, out).map_err(transfer_failed)?;
        device.stream.synchronize().map_err(transfer_failed)
    }

    fn release_buffer(&self, _device: &Self::Device, buffer: Self::Buffer) {
        drop(buffer);
    }
}

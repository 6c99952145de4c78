//! Host emulation of the curved kernel
//!
//! Runs the same tiled computation the accelerator binary performs, reading
//! and writing the wire-format buffers. Used on hosts without a device and as
//! the reference the packing layer is tested against.

use tracing::{debug, instrument};

use crate::image_pipeline::accelerator::runtime::{AcceleratorRuntime, BufferMode, KernelArgs, KERNEL_NAME};
use crate::image_pipeline::common::error::{OffloadError, Result};
use crate::image_pipeline::packing::{alloc_zeroed, layout};
use crate::image_pipeline::tables::ColorTransform;
use crate::image_pipeline::tiling::{TileGeometry, TilePlan, DEMOSAIC_BORDER};

#[derive(Debug, Clone)]
pub struct SoftwareDevice {
    pub vendor: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SoftwareProgram {
    pub kernel_name: String,
    pub binary_len: usize,
}

#[derive(Debug, Clone)]
pub struct SoftwareBuffer {
    bytes: Vec<u8>,
    mode: BufferMode,
}

impl SoftwareBuffer {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }
}

/// Emulated device accepting any vendor and device name.
#[derive(Debug, Clone, Copy)]
pub struct SoftwareAccelerator {
    geometry: TileGeometry,
}

impl SoftwareAccelerator {
    pub fn new(geometry: TileGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }
}

impl Default for SoftwareAccelerator {
    fn default() -> Self {
        Self::new(TileGeometry::ACCELERATOR)
    }
}

impl AcceleratorRuntime for SoftwareAccelerator {
    type Device = SoftwareDevice;
    type Program = SoftwareProgram;
    type Buffer = SoftwareBuffer;

    fn find_device(&self, vendor: &str, device_name: &str) -> Result<Self::Device> {
        debug!(vendor, device = device_name, "Using software accelerator");
        Ok(SoftwareDevice {
            vendor: vendor.to_string(),
            name: device_name.to_string(),
        })
    }

    fn build_program(&self, _device: &Self::Device, binary: &[u8], kernel_name: &str) -> Result<Self::Program> {
        if binary.is_empty() {
            return Err(OffloadError::BuildFailed("kernel binary is empty".to_string()));
        }
        if kernel_name != KERNEL_NAME {
            return Err(OffloadError::BuildFailed(format!(
                "kernel {kernel_name} not found in binary"
            )));
        }
        Ok(SoftwareProgram {
            kernel_name: kernel_name.to_string(),
            binary_len: binary.len(),
        })
    }

    fn create_buffer(&self, _device: &Self::Device, size: usize, mode: BufferMode) -> Result<Self::Buffer> {
        Ok(SoftwareBuffer {
            bytes: alloc_zeroed::<u8>(size, "device")?,
            mode,
        })
    }

    fn write(&self, _device: &Self::Device, buffer: &mut Self::Buffer, data: &[u8]) -> Result<()> {
        if data.len() > buffer.bytes.len() {
            return Err(OffloadError::TransferFailed {
                buffer: "device",
                reason: format!("{} bytes into a {} byte buffer", data.len(), buffer.bytes.len()),
            });
        }
        buffer.bytes[..data.len()].copy_from_slice(data);
        Ok(())
    }

    #[instrument(skip_all, fields(tiles_x = args.tile_count[0], tiles_y = args.tile_count[1]))]
    fn enqueue_kernel(
        &self,
        _device: &Self::Device,
        program: &Self::Program,
        args: KernelArgs<'_, Self::Buffer>,
    ) -> Result<()> {
        let transform = ColorTransform::from_device_bytes(&args.matrix.bytes, &args.curve.bytes)
            .ok_or_else(|| OffloadError::ExecutionFailed("matrix or curve buffer is truncated".to_string()))?;

        let output_extent = args.output_extent;
        let input_extent = output_extent.map(|e| e + DEMOSAIC_BORDER);
        let plan = TilePlan::new(self.geometry, output_extent, input_extent);
        if [plan.tile_count_dim0(), plan.tile_count_dim1()] != args.tile_count {
            return Err(OffloadError::ExecutionFailed(format!(
                "tile grid {:?} does not match the {:?} grid of {}",
                args.tile_count,
                [plan.tile_count_dim0(), plan.tile_count_dim1()],
                program.kernel_name
            )));
        }

        let input = &args.input.bytes;
        if input.len() < plan.packed_input_len() * 2 || args.output.bytes.len() < plan.packed_output_len() {
            return Err(OffloadError::ExecutionFailed(
                "device buffers are smaller than the tile grid".to_string(),
            ));
        }

        let geometry = &self.geometry;
        let tap = (DEMOSAIC_BORDER / 2) as usize;
        let output = &mut args.output.bytes;
        for tile in plan.tiles() {
            for j in 0..tile.output_span[1] as usize {
                for i in 0..tile.output_span[0] as usize {
                    let at = layout::input_offset(geometry, tile.index, i + tap, j + tap) * 2;
                    let raw = u16::from_le_bytes([input[at], input[at + 1]]);
                    let rgb = transform.apply([raw; 3]);
                    for (k, value) in rgb.into_iter().enumerate() {
                        output[layout::output_offset(geometry, tile.index, i, j, k)] = value;
                    }
                }
            }
        }

        debug!(tiles = plan.total_tiles(), "Software kernel finished");
        Ok(())
    }

    fn read(&self, _device: &Self::Device, buffer: &Self::Buffer, out: &mut [u8]) -> Result<()> {
        if out.len() > buffer.bytes.len() {
            return Err(OffloadError::TransferFailed {
                buffer: "device",
                reason: format!("{} bytes from a {} byte buffer", out.len(), buffer.bytes.len()),
            });
        }
        out.copy_from_slice(&buffer.bytes[..out.len()]);
        Ok(())
    }

    fn release_buffer(&self, _device: &Self::Device, buffer: Self::Buffer) {
        drop(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::tables::{IlluminantMatrices, ToneParams};

    fn upload(runtime: &SoftwareAccelerator, device: &SoftwareDevice, bytes: &[u8]) -> SoftwareBuffer {
        let mut buffer = runtime.create_buffer(device, bytes.len(), BufferMode::ReadOnly).unwrap();
        runtime.write(device, &mut buffer, bytes).unwrap();
        buffer
    }

    #[test]
    fn test_build_rejects_unknown_kernel() {
        let runtime = SoftwareAccelerator::default();
        let device = runtime.find_device("Xilinx", "any").unwrap();
        assert!(runtime.build_program(&device, b"xclbin", KERNEL_NAME).is_ok());
        assert!(matches!(
            runtime.build_program(&device, b"xclbin", "other_kernel"),
            Err(OffloadError::BuildFailed(_))
        ));
        assert!(matches!(
            runtime.build_program(&device, b"", KERNEL_NAME),
            Err(OffloadError::BuildFailed(_))
        ));
    }

    #[test]
    fn test_oversized_transfers_fail() {
        let runtime = SoftwareAccelerator::default();
        let device = runtime.find_device("Xilinx", "any").unwrap();
        let mut buffer = runtime.create_buffer(&device, 4, BufferMode::WriteOnly).unwrap();
        assert!(matches!(
            runtime.write(&device, &mut buffer, &[0; 8]),
            Err(OffloadError::TransferFailed { .. })
        ));
        let mut out = [0u8; 8];
        assert!(matches!(
            runtime.read(&device, &buffer, &mut out),
            Err(OffloadError::TransferFailed { .. })
        ));
    }

    #[test]
    fn test_kernel_writes_center_tap_through_tables() {
        let runtime = SoftwareAccelerator::default();
        let device = runtime.find_device("Xilinx", "any").unwrap();
        let program = runtime.build_program(&device, b"xclbin", KERNEL_NAME).unwrap();
        let geometry = TileGeometry::ACCELERATOR;

        let mut tile = vec![0u8; geometry.input_tile_len() * 2];
        for y in 0..4 {
            for x in 0..4 {
                let value = (100 * y + 10 * x) as u16;
                let at = layout::input_offset(&geometry, 0, x, y) * 2;
                tile[at..at + 2].copy_from_slice(&value.to_le_bytes());
            }
        }

        let params = ToneParams {
            color_temp: 3200.0,
            gamma: 1.0,
            contrast: 0.0,
            black_level: 0,
            white_level: 1023,
        };
        let transform = ColorTransform::build(&params, &IlluminantMatrices::CAMERA_PIPE);
        let matrix = upload(&runtime, &device, &transform.matrix_bytes());
        let curve = upload(&runtime, &device, &transform.curve);
        let input = upload(&runtime, &device, &tile);
        let mut output = runtime
            .create_buffer(&device, geometry.output_tile_len(), BufferMode::WriteOnly)
            .unwrap();

        runtime
            .enqueue_kernel(
                &device,
                &program,
                KernelArgs {
                    matrix: &matrix,
                    curve: &curve,
                    output: &mut output,
                    input: &input,
                    tile_count: [1, 1],
                    output_extent: [2, 2],
                    output_min: [0, 0],
                },
            )
            .unwrap();

        for y in 0..2 {
            for x in 0..2 {
                let raw = (100 * (y + 1) + 10 * (x + 1)) as u16;
                let expected = transform.apply([raw; 3]);
                for k in 0..3 {
                    let slot = layout::output_offset(&geometry, 0, x, y, k);
                    assert_eq!(output.bytes()[slot], expected[k], "pixel ({x}, {y}) channel {k}");
                }
            }
        }
    }

    #[test]
    fn test_kernel_rejects_mismatched_grid() {
        let runtime = SoftwareAccelerator::default();
        let device = runtime.find_device("Xilinx", "any").unwrap();
        let program = runtime.build_program(&device, b"xclbin", KERNEL_NAME).unwrap();
        let transform = ColorTransform::build(&ToneParams::default(), &IlluminantMatrices::CAMERA_PIPE);
        let matrix = upload(&runtime, &device, &transform.matrix_bytes());
        let curve = upload(&runtime, &device, &transform.curve);
        let input = upload(&runtime, &device, &vec![0u8; 4 * 128 * 128 * 2]);
        let mut output = runtime
            .create_buffer(&device, 4 * TileGeometry::ACCELERATOR.output_tile_len(), BufferMode::WriteOnly)
            .unwrap();

        let result = runtime.enqueue_kernel(
            &device,
            &program,
            KernelArgs {
                matrix: &matrix,
                curve: &curve,
                output: &mut output,
                input: &input,
                tile_count: [2, 2],
                output_extent: [10, 10],
                output_min: [0, 0],
            },
        );
        assert!(matches!(result, Err(OffloadError::ExecutionFailed(_))));
    }
}

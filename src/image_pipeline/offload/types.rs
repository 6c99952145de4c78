//! Offload configuration types

use crate::image_pipeline::accelerator::KERNEL_NAME;
use crate::image_pipeline::tiling::TileGeometry;

/// Configuration for one offload pipeline
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    /// Platform vendor the device must belong to
    pub vendor: String,
    /// Target device name; empty selects the vendor's first device
    pub device_name: String,
    /// Kernel symbol inside the accelerator binary
    pub kernel_name: String,
    /// Tile window the kernel binary was built for
    pub geometry: TileGeometry,
    /// Pack tiles on the rayon pool instead of the calling thread
    pub parallel_packing: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            vendor: "Xilinx".to_string(),
            device_name: String::new(),
            kernel_name: KERNEL_NAME.to_string(),
            geometry: TileGeometry::ACCELERATOR,
            parallel_packing: true,
        }
    }
}

impl OffloadConfig {
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for OffloadConfig
#[derive(Default)]
pub struct OffloadConfigBuilder {
    vendor: Option<String>,
    device_name: Option<String>,
    kernel_name: Option<String>,
    geometry: Option<TileGeometry>,
    parallel_packing: Option<bool>,
}

impl OffloadConfigBuilder {
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    pub fn kernel_name(mut self, kernel_name: impl Into<String>) -> Self {
        self.kernel_name = Some(kernel_name.into());
        self
    }

    pub fn geometry(mut self, geometry: TileGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn parallel_packing(mut self, enable: bool) -> Self {
        self.parallel_packing = Some(enable);
        self
    }

    pub fn build(self) -> OffloadConfig {
        let default = OffloadConfig::default();
        OffloadConfig {
            vendor: self.vendor.unwrap_or(default.vendor),
            device_name: self.device_name.unwrap_or(default.device_name),
            kernel_name: self.kernel_name.unwrap_or(default.kernel_name),
            geometry: self.geometry.unwrap_or(default.geometry),
            parallel_packing: self.parallel_packing.unwrap_or(default.parallel_packing),
        }
    }
}

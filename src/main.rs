use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use curved_offload::image_pipeline::{
    AcceleratorRuntime, ConversionConfig, OffloadConfig, OffloadPipeline, RawLoaderReader, RawToCurvedPipeline,
    StandardTiffWriter, TiffCompression,
};
use curved_offload::logger;

use tracing::{error, info, warn};

const DEFAULT_BINARY: &str = "curved.xclbin";

fn run<A: AcceleratorRuntime>(
    offload: OffloadPipeline<A>,
    input: &Path,
    output: &Path,
    binary: &Path,
) -> anyhow::Result<()> {
    let config = ConversionConfig::builder()
        .compression(TiffCompression::None)
        .build();
    let pipeline = RawToCurvedPipeline::with_custom(RawLoaderReader, StandardTiffWriter, offload, config);

    info!("RAW to curved TIFF pipeline initialized");
    info!("Compression: {:?}", pipeline.config().compression);
    info!(
        "Tone: {}K, gamma {}, contrast {}",
        pipeline.config().color_temp,
        pipeline.config().gamma,
        pipeline.config().contrast
    );

    let report = pipeline
        .convert_file(input, output, binary)
        .with_context(|| format!("converting {}", input.display()))?;
    report.timings.print_summary();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        bail!("usage: {} <input.raw> <output.tiff> [kernel-binary]", args[0]);
    }
    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);
    let binary = PathBuf::from(args.get(3).map_or(DEFAULT_BINARY, String::as_str));

    info!("Starting curved offload...");

    match convert(&input, &output, &binary) {
        Ok(()) => info!("Conversion successful!"),
        Err(e) => {
            error!("Conversion failed: {e:#}");
            return Err(e);
        }
    }
    Ok(())
}

/// Uses the CUDA runtime when one is available, the software accelerator otherwise.
fn convert(input: &Path, output: &Path, binary: &Path) -> anyhow::Result<()> {
    #[cfg(jetson_cuda)]
    {
        use curved_offload::image_pipeline::CudaRuntime;

        match CudaRuntime::new() {
            Ok(runtime) => {
                let config = OffloadConfig::builder().vendor("NVIDIA").build();
                return run(OffloadPipeline::with_runtime(runtime, config), input, output, binary);
            }
            Err(e) => warn!("CUDA runtime unavailable, using the software accelerator: {e}"),
        }
    }
    #[cfg(not(jetson_cuda))]
    warn!("No accelerator runtime on this platform, using the software accelerator");

    run(OffloadPipeline::new(OffloadConfig::default()), input, output, binary)
}

use std::path::Path;

use tracing::{debug, info, info_span, instrument, warn};

use crate::image_pipeline::{
    accelerator::{AcceleratorRuntime, BufferMode, DeviceBuffer, KernelArgs, SoftwareAccelerator},
    buffer::{HostView, HostViewMut},
    common::error::{ErrorCode, Result, StageError},
    offload::{
        stage::Stage,
        timing::{PipelineTimings, Timer},
        types::OffloadConfig,
    },
    packing::{alloc_zeroed, encode_le, pack_input, unpack_output},
    tables::{ColorTransform, IlluminantMatrices, ToneParams},
    tiling::TilePlan,
    validate::{resolve_sizing, validate, Contract},
};

/// What a successful call produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A buffer was unallocated; its descriptor now holds the required shape.
    SizingQuery,
    Completed(ProcessReport),
}

impl Outcome {
    pub fn is_sizing_query(&self) -> bool {
        matches!(self, Outcome::SizingQuery)
    }

    pub fn report(&self) -> Option<&ProcessReport> {
        match self {
            Outcome::Completed(report) => Some(report),
            Outcome::SizingQuery => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub plan: TilePlan,
    pub timings: PipelineTimings,
}

/// The four device allocations of one call.
struct DeviceBuffers<'r, R: AcceleratorRuntime> {
    matrix: DeviceBuffer<'r, R>,
    curve: DeviceBuffer<'r, R>,
    input: DeviceBuffer<'r, R>,
    output: DeviceBuffer<'r, R>,
}

pub struct OffloadPipeline<R: AcceleratorRuntime> {
    runtime: R,
    config: OffloadConfig,
}

impl OffloadPipeline<SoftwareAccelerator> {
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            runtime: SoftwareAccelerator::new(config.geometry),
            config,
        }
    }
}

impl<R: AcceleratorRuntime> OffloadPipeline<R> {
    pub fn with_runtime(runtime: R, config: OffloadConfig) -> Self {
        Self { runtime, config }
    }

    /// Runs the curved stage on the accelerator.
    ///
    /// Stages run strictly in order and the first failure ends the call,
    /// tagged with the stage it happened in. Device buffers are released on
    /// every path.
    #[instrument(skip_all, fields(binary = %binary_path.display()))]
    pub fn process(
        &self,
        params: &ToneParams,
        illuminants: &IlluminantMatrices,
        input: &mut HostView<'_, u16>,
        output: &mut HostViewMut<'_, u8>,
        binary_path: &Path,
    ) -> std::result::Result<Outcome, StageError> {
        let mut timings = PipelineTimings::new();
        info!("Starting curved offload");

        let sizing_query = run_stage(&mut timings, Stage::Validating, || {
            if resolve_sizing(input.descriptor_mut(), output.descriptor_mut()) {
                return Ok(true);
            }
            validate(&Contract::from_views(input, output))?;
            Ok(false)
        })?;
        if sizing_query {
            info!(
                input = ?input.descriptor().dims(),
                output = ?output.descriptor().dims(),
                "Answered sizing query"
            );
            return Ok(Outcome::SizingQuery);
        }

        let plan = run_stage(&mut timings, Stage::Planning, || {
            let (i, o) = (input.descriptor(), output.descriptor());
            Ok(TilePlan::new(
                self.config.geometry,
                [o.extent(0), o.extent(1)],
                [i.extent(0), i.extent(1)],
            ))
        })?;

        if plan.total_tiles() == 0 {
            debug!("Output is empty, skipping the accelerator");
            return Ok(Outcome::Completed(ProcessReport { plan, timings }));
        }

        let transform = run_stage(&mut timings, Stage::BuildingTables, || {
            Ok(ColorTransform::build(params, illuminants))
        })?;

        let packed = run_stage(&mut timings, Stage::Packing, || {
            let tiles = pack_input(&plan, input, self.config.parallel_packing)?;
            encode_le(&tiles, "input tiles")
        })?;

        let (device, program) = run_stage(&mut timings, Stage::Connecting, || {
            let device = self
                .runtime
                .find_device(&self.config.vendor, &self.config.device_name)?;
            info!(path = %binary_path.display(), "Loading kernel binary");
            let binary = self.runtime.load_binary(binary_path)?;
            let program = self
                .runtime
                .build_program(&device, &binary, &self.config.kernel_name)?;
            Ok((device, program))
        })?;

        let mut buffers = run_stage(&mut timings, Stage::Transferring, || {
            let matrix_bytes = transform.matrix_bytes();
            let mut buffers = DeviceBuffers {
                matrix: DeviceBuffer::allocate(&self.runtime, &device, "matrix", matrix_bytes.len(), BufferMode::ReadOnly)?,
                curve: DeviceBuffer::allocate(&self.runtime, &device, "curve", transform.curve.len(), BufferMode::ReadOnly)?,
                input: DeviceBuffer::allocate(&self.runtime, &device, "input tiles", packed.len(), BufferMode::ReadOnly)?,
                output: DeviceBuffer::allocate(
                    &self.runtime,
                    &device,
                    "output tiles",
                    plan.packed_output_len(),
                    BufferMode::WriteOnly,
                )?,
            };
            buffers.matrix.write(&matrix_bytes)?;
            buffers.curve.write(&transform.curve)?;
            buffers.input.write(&packed)?;
            Ok(buffers)
        })?;

        let (out_desc, tile_count) = (*output.descriptor(), [plan.tile_count_dim0(), plan.tile_count_dim1()]);
        run_stage(&mut timings, Stage::Executing, || {
            self.runtime.enqueue_kernel(
                &device,
                &program,
                KernelArgs {
                    matrix: buffers.matrix.get(),
                    curve: buffers.curve.get(),
                    output: buffers.output.get_mut(),
                    input: buffers.input.get(),
                    tile_count,
                    output_extent: [out_desc.extent(0), out_desc.extent(1)],
                    output_min: [out_desc.min(0), out_desc.min(1)],
                },
            )
        })?;

        let tiled = run_stage(&mut timings, Stage::ReadingBack, || {
            let mut tiled = alloc_zeroed::<u8>(plan.packed_output_len(), "output tiles")?;
            buffers.output.read(&mut tiled)?;
            Ok(tiled)
        })?;
        drop(buffers);

        run_stage(&mut timings, Stage::Unpacking, || unpack_output(&plan, &tiled, output))?;

        let millis = |stage| timings.get_step(stage).unwrap_or_default().as_secs_f64() * 1000.0;
        info!(
            write_ms = millis(Stage::Transferring),
            kernel_ms = millis(Stage::Executing),
            read_ms = millis(Stage::ReadingBack),
            "Accelerator timings"
        );
        info!(
            tiles_x = plan.tile_count_dim0(),
            tiles_y = plan.tile_count_dim1(),
            total_ms = timings.total_duration().as_secs_f64() * 1000.0,
            stage = %Stage::Done,
            "Curved offload complete"
        );
        Ok(Outcome::Completed(ProcessReport { plan, timings }))
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OffloadConfig) {
        self.config = config;
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

/// Times one stage and tags its error with the stage.
fn run_stage<T>(
    timings: &mut PipelineTimings,
    stage: Stage,
    body: impl FnOnce() -> Result<T>,
) -> std::result::Result<T, StageError> {
    let _span = info_span!("stage", name = %stage).entered();
    let timer = Timer::start(stage);
    let result = body();
    let (stage, duration) = timer.stop();
    timings.add_step(stage, duration);
    debug!(elapsed_ms = duration.as_secs_f64() * 1000.0, "Stage finished");

    result.map_err(|source| {
        warn!(code = source.code(), error = %source, "Curved offload failed");
        StageError::new(stage, source)
    })
}

/// Flat entry point: runs one call with the default configuration and
/// reports the outcome as an [`ErrorCode`] (0 on success, sizing queries included).
#[allow(clippy::too_many_arguments)]
pub fn curved<R: AcceleratorRuntime>(
    color_temp: f32,
    gamma: f32,
    contrast: f32,
    black_level: i32,
    white_level: i32,
    input: &mut HostView<'_, u16>,
    m3200: &[[f32; 4]; 3],
    m7000: &[[f32; 4]; 3],
    output: &mut HostViewMut<'_, u8>,
    binary: &Path,
    runtime: R,
) -> ErrorCode {
    let params = ToneParams {
        color_temp,
        gamma,
        contrast,
        black_level,
        white_level,
    };
    let illuminants = IlluminantMatrices {
        m3200: *m3200,
        m7000: *m7000,
    };
    let pipeline = OffloadPipeline::with_runtime(runtime, OffloadConfig::default());
    ErrorCode::from(&pipeline.process(&params, &illuminants, input, output, binary))
}

use std::fmt;

use tracing::trace;

use crate::image_pipeline::buffer::{BufferDescriptor, Element, HostView, HostViewMut};
use crate::image_pipeline::common::error::{OffloadError, Result, MAX_BUFFER_SIZE};
use crate::image_pipeline::packing::layout::OUTPUT_CHANNELS;
use crate::image_pipeline::tiling::DEMOSAIC_BORDER;

/// Which side of the call a check inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Output => "output",
        }
    }

    fn element(self) -> (i32, &'static str) {
        match self {
            Role::Input => (u16::ELEM_SIZE, u16::TYPE_NAME),
            Role::Output => (u8::ELEM_SIZE, u8::TYPE_NAME),
        }
    }
}

/// The two descriptors of a call plus the length of their host storage.
#[derive(Debug, Clone, Copy)]
pub struct Contract<'a> {
    pub input: &'a BufferDescriptor,
    pub output: &'a BufferDescriptor,
    pub input_len: usize,
    pub output_len: usize,
}

impl<'a> Contract<'a> {
    pub fn from_views(input: &'a HostView<'_, u16>, output: &'a HostViewMut<'_, u8>) -> Self {
        Self {
            input: input.descriptor(),
            output: output.descriptor(),
            input_len: input.data().map_or(0, <[u16]>::len),
            output_len: output.data().map_or(0, <[u8]>::len),
        }
    }

    fn buffer(&self, role: Role) -> (&BufferDescriptor, usize) {
        match role {
            Role::Input => (self.input, self.input_len),
            Role::Output => (self.output, self.output_len),
        }
    }
}

/// One named predicate over a [`Contract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ElementSize(Role),
    /// Input covers the output footprint plus the demosaic border on one axis.
    Coverage(usize),
    FastAxis(Role),
    ChannelCount,
    Overflow(Role),
    HostFootprint(Role),
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::ElementSize(role) => write!(f, "{}.elem_size", role.name()),
            Check::Coverage(axis) => write!(f, "input.coverage.{axis}"),
            Check::FastAxis(role) => write!(f, "{}.stride.0", role.name()),
            Check::ChannelCount => write!(f, "output.extent.2"),
            Check::Overflow(role) => write!(f, "{}.overflow", role.name()),
            Check::HostFootprint(role) => write!(f, "{}.host_footprint", role.name()),
        }
    }
}

impl Check {
    pub fn run(&self, contract: &Contract<'_>) -> Result<()> {
        match *self {
            Check::ElementSize(role) => check_elem_size(role, contract),
            Check::Coverage(axis) => check_coverage(axis, contract),
            Check::FastAxis(role) => {
                let (desc, _) = contract.buffer(role);
                expect_eq(format!("{}.stride.0", role.name()), desc.stride(0), 1)
            }
            Check::ChannelCount => expect_eq(
                "output.extent.2".to_string(),
                contract.output.extent(2),
                OUTPUT_CHANNELS as i32,
            ),
            Check::Overflow(role) => check_overflow(role, contract),
            Check::HostFootprint(role) => check_host_footprint(role, contract),
        }
    }
}

fn check_elem_size(role: Role, contract: &Contract<'_>) -> Result<()> {
    let (desc, _) = contract.buffer(role);
    let (expected, type_name) = role.element();
    if desc.elem_size() != expected {
        return Err(OffloadError::BadElementSize {
            buffer: role.name(),
            type_name,
            expected,
            actual: desc.elem_size(),
        });
    }
    Ok(())
}

fn check_coverage(axis: usize, contract: &Contract<'_>) -> Result<()> {
    let output = contract.output.dim(axis);
    let input = contract.input.dim(axis);

    let min_touched = output.min as i64;
    let max_touched = output.min as i64 + output.extent as i64 + DEMOSAIC_BORDER as i64 - 1;
    let min_valid = input.min as i64;
    let max_valid = input.max();

    if min_touched < min_valid || max_touched > max_valid {
        return Err(OffloadError::AccessOutOfBounds {
            buffer: Role::Input.name(),
            dimension: axis,
            min_touched,
            max_touched,
            min_valid,
            max_valid,
        });
    }
    Ok(())
}

fn expect_eq(variable: String, actual: i32, expected: i32) -> Result<()> {
    if actual != expected {
        return Err(OffloadError::ConstraintViolated {
            variable,
            actual: actual as i64,
            expected: expected as i64,
        });
    }
    Ok(())
}

fn check_overflow(role: Role, contract: &Contract<'_>) -> Result<()> {
    let (desc, _) = contract.buffer(role);
    let buffer = role.name();

    for (axis, d) in desc.dims().iter().enumerate() {
        let size = if axis == 0 {
            d.extent as i64
        } else {
            (d.extent as i64 * d.stride as i64).abs()
        };
        if size > MAX_BUFFER_SIZE {
            return Err(OffloadError::BufferAllocationTooLarge {
                buffer,
                size,
                max: MAX_BUFFER_SIZE,
            });
        }
    }

    let extents = desc.element_count();
    if extents > MAX_BUFFER_SIZE {
        return Err(OffloadError::BufferExtentsTooLarge {
            buffer,
            size: extents,
            max: MAX_BUFFER_SIZE,
        });
    }

    let bytes = extents * desc.elem_size() as i64;
    if bytes > MAX_BUFFER_SIZE {
        return Err(OffloadError::BufferAllocationTooLarge {
            buffer,
            size: bytes,
            max: MAX_BUFFER_SIZE,
        });
    }
    Ok(())
}

fn check_host_footprint(role: Role, contract: &Contract<'_>) -> Result<()> {
    let (desc, len) = contract.buffer(role);
    let Some((lo, hi)) = desc.footprint() else {
        return Ok(());
    };
    if lo < 0 || hi >= len as i64 {
        return Err(OffloadError::HostBufferTooSmall {
            buffer: role.name(),
            required: hi + 1,
            actual: len,
        });
    }
    Ok(())
}

/// Ordered checks; the first failure is the one reported.
#[derive(Debug, Clone)]
pub struct CheckList {
    checks: Vec<Check>,
}

impl CheckList {
    pub fn standard() -> Self {
        Self {
            checks: vec![
                Check::ElementSize(Role::Output),
                Check::ElementSize(Role::Input),
                Check::Coverage(0),
                Check::Coverage(1),
                Check::FastAxis(Role::Output),
                Check::FastAxis(Role::Input),
                Check::ChannelCount,
                Check::Overflow(Role::Output),
                Check::Overflow(Role::Input),
                Check::HostFootprint(Role::Output),
                Check::HostFootprint(Role::Input),
            ],
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn run(&self, contract: &Contract<'_>) -> Result<()> {
        for check in &self.checks {
            trace!(check = %check, "Checking buffer contract");
            check.run(contract)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::buffer::Dim;

    fn dense_input(width: i32, height: i32) -> BufferDescriptor {
        BufferDescriptor::for_element::<u16>(&[width, height])
    }

    fn planar_output(width: i32, height: i32) -> BufferDescriptor {
        BufferDescriptor::for_element::<u8>(&[width, height, 3])
    }

    fn contract<'a>(input: &'a BufferDescriptor, output: &'a BufferDescriptor) -> Contract<'a> {
        Contract {
            input,
            output,
            input_len: input.element_count() as usize,
            output_len: output.element_count() as usize,
        }
    }

    #[test]
    fn test_check_names_are_stable() {
        let names: Vec<String> = CheckList::standard().checks().iter().map(Check::to_string).collect();
        assert_eq!(
            names,
            [
                "output.elem_size",
                "input.elem_size",
                "input.coverage.0",
                "input.coverage.1",
                "output.stride.0",
                "input.stride.0",
                "output.extent.2",
                "output.overflow",
                "input.overflow",
                "output.host_footprint",
                "input.host_footprint",
            ]
        );
    }

    #[test]
    fn test_valid_contract_passes() {
        let input = dense_input(130, 66);
        let output = planar_output(128, 64);
        assert!(CheckList::standard().run(&contract(&input, &output)).is_ok());
    }

    #[test]
    fn test_element_size_reported_before_coverage() {
        let input = dense_input(3, 3).with_elem_size(4);
        let output = planar_output(8, 8);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::BadElementSize {
                buffer: "input",
                type_name: "uint16",
                expected: 2,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_output_element_size_checked_first() {
        let input = dense_input(4, 4).with_elem_size(1);
        let output = planar_output(2, 2).with_elem_size(2);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert!(matches!(err, OffloadError::BadElementSize { buffer: "output", .. }));
    }

    #[test]
    fn test_coverage_reports_touched_and_valid_ranges() {
        let input = dense_input(9, 20);
        let output = planar_output(8, 8);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::AccessOutOfBounds {
                buffer: "input",
                dimension: 0,
                min_touched: 0,
                max_touched: 9,
                min_valid: 0,
                max_valid: 8,
            }
        );
        assert_eq!(
            err.to_string(),
            "input is accessed at 9, which is beyond the max (8) in dimension 0"
        );
    }

    #[test]
    fn test_coverage_rejects_input_starting_after_output() {
        let input = dense_input(10, 10).with_min(1, 1);
        let output = planar_output(8, 8);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert!(matches!(
            err,
            OffloadError::AccessOutOfBounds { dimension: 1, min_touched: 0, min_valid: 1, .. }
        ));
    }

    #[test]
    fn test_fast_axis_must_be_dense() {
        let input = dense_input(4, 4);
        let output = BufferDescriptor::interleaved::<u8>(2, 2, 3);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::ConstraintViolated {
                variable: "output.stride.0".to_string(),
                actual: 3,
                expected: 1,
            }
        );
    }

    #[test]
    fn test_channel_count() {
        let input = dense_input(4, 4);
        let output = BufferDescriptor::for_element::<u8>(&[2, 2, 4]);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert!(matches!(err, OffloadError::ConstraintViolated { ref variable, actual: 4, expected: 3 } if variable == "output.extent.2"));
    }

    #[test]
    fn test_overflow_checks() {
        let input = BufferDescriptor::new(2, &[Dim::new(0, 70_000, 1), Dim::new(0, 40_000, 70_000)]);
        let output = planar_output(10, 10);
        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::BufferAllocationTooLarge {
                buffer: "input",
                size: 70_000 * 40_000,
                max: MAX_BUFFER_SIZE,
            }
        );

        // Strides small enough per axis, but too many elements in total.
        let input = BufferDescriptor::new(2, &[Dim::new(0, 50_000, 1), Dim::new(0, 50_000, 0)]);
        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert!(matches!(err, OffloadError::BufferExtentsTooLarge { buffer: "input", .. }));

        // Element count fits, byte count does not.
        let input = BufferDescriptor::new(2, &[Dim::new(0, 40_000, 1), Dim::new(0, 40_000, 0)]);
        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::BufferAllocationTooLarge {
                buffer: "input",
                size: 40_000i64 * 40_000 * 2,
                max: MAX_BUFFER_SIZE,
            }
        );
    }

    #[test]
    fn test_coverage_reported_before_stride() {
        let input = BufferDescriptor::new(2, &[Dim::new(0, 9, 2), Dim::new(0, 20, 18)]);
        let output = planar_output(8, 8);

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert!(matches!(
            err,
            OffloadError::AccessOutOfBounds { buffer: "input", dimension: 0, max_touched: 9, max_valid: 8, .. }
        ));
    }

    #[test]
    fn test_stride_reported_before_overflow() {
        let input = dense_input(12, 12);
        let output = BufferDescriptor::new(
            1,
            &[Dim::new(0, 10, 2), Dim::new(0, 10, 300_000_000), Dim::new(0, 3, 1)],
        );

        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::ConstraintViolated {
                variable: "output.stride.0".to_string(),
                actual: 2,
                expected: 1,
            }
        );
    }

    #[test]
    fn test_output_overflow_checks() {
        let input = dense_input(12, 12);
        let output = BufferDescriptor::new(
            1,
            &[Dim::new(0, 10, 1), Dim::new(0, 10, 300_000_000), Dim::new(0, 3, 1)],
        );
        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::BufferAllocationTooLarge {
                buffer: "output",
                size: 3_000_000_000,
                max: MAX_BUFFER_SIZE,
            }
        );

        let input = BufferDescriptor::new(2, &[Dim::new(0, 50_002, 1), Dim::new(0, 50_002, 0)]);
        let output = BufferDescriptor::new(
            1,
            &[Dim::new(0, 50_000, 1), Dim::new(0, 50_000, 0), Dim::new(0, 3, 0)],
        );
        let err = CheckList::standard().run(&contract(&input, &output)).unwrap_err();
        assert_eq!(
            err,
            OffloadError::BufferExtentsTooLarge {
                buffer: "output",
                size: 50_000i64 * 50_000 * 3,
                max: MAX_BUFFER_SIZE,
            }
        );
    }

    #[test]
    fn test_host_storage_must_hold_footprint() {
        let input = dense_input(4, 4);
        let output = planar_output(2, 2);
        let mut short = contract(&input, &output);
        short.input_len = 15;

        let err = CheckList::standard().run(&short).unwrap_err();
        assert_eq!(
            err,
            OffloadError::HostBufferTooSmall {
                buffer: "input",
                required: 16,
                actual: 15,
            }
        );
    }
}

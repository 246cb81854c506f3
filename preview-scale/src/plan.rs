// SPDX-License-Identifier: MIT
//! # Square Crop Planning
//!
//! Preview output is always square. The plan takes the largest centered square
//! from the input frame and maps it onto an `out_side × out_side` canvas.
//! Rotation is applied after scaling, so it never changes the plan.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }
}

/// Crop rectangle plus output side for a square rescale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareCropPlan {
    /// Original input dimensions
    pub input: Size,
    /// Left edge of the crop square in input pixels
    pub left: u32,
    /// Top edge of the crop square in input pixels
    pub top: u32,
    /// Side of the crop square in input pixels
    pub side: u32,
    /// Side of the square output canvas
    pub out_side: u32,
}

impl SquareCropPlan {
    /// Bytes needed for a BGRA8 output buffer.
    pub fn out_len_bgra(&self) -> usize {
        self.out_side as usize * self.out_side as usize * 4
    }
}

/// Compute a centered square crop for `input` rescaled to `out_side`.
///
/// Degenerate sizes are clamped to 1px so downstream buffer math never sees zero.
pub fn build_square_plan(input: Size, out_side: u32) -> SquareCropPlan {
    let side = input.w.min(input.h).max(1);
    SquareCropPlan {
        input,
        left: input.w.saturating_sub(side) / 2,
        top: input.h.saturating_sub(side) / 2,
        side,
        out_side: out_side.max(1),
    }
}

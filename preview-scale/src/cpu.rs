// SPDX-License-Identifier: MIT
// CPU crop/rescale built on fast_image_resize (SIMD-accelerated).
// BGRA8 in → square BGRA8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};

use crate::plan::SquareCropPlan;
use crate::rotate::{rotate_square_bgra, Rotation};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall,
    EmptyInput,
    PlaneTooSmall { plane: &'static str },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall => write!(f, "Output buffer too small"),
            ScaleError::EmptyInput => write!(f, "Input image has zero width or height"),
            ScaleError::PlaneTooSmall { plane } => write!(f, "Plane '{}' is shorter than its strides require", plane),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Pre-allocated scratch for the unrotated square before the final rotation pass.
pub struct Staging {
    pub(crate) buf: Vec<u8>,
}
impl Staging {
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    pub fn ensure_len(&mut self, len: usize) { if self.buf.len() < len { self.buf.resize(len, 0); } }
    pub fn as_slice(&self) -> &[u8] { &self.buf }
}

/// Main crop/rescale entry point.
/// `src_bgra` must be tightly packed `plan.input.w * plan.input.h * 4` bytes.
/// `dst` must be at least `plan.out_side * plan.out_side * 4` bytes (BGRA).
/// Staging is only touched when `rotation` is not the identity.
pub fn crop_and_rescale_bgra(
    resizer: &mut Resizer,
    src_bgra: &[u8],
    plan: &SquareCropPlan,
    rotation: Rotation,
    staging: &mut Staging,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    if plan.input.w == 0 || plan.input.h == 0 {
        return Err(ScaleError::EmptyInput);
    }
    let dst_len = plan.out_len_bgra();
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    // --- Source view (tightly packed) ---
    let src_view = TypedImageRef::<U8x4>::from_buffer(plan.input.w, plan.input.h, src_bgra)?;

    // --- Crop box + resize ---
    let opts = ResizeOptions::new()
        .crop(
            plan.left as f64,
            plan.top as f64,
            plan.side as f64,
            plan.side as f64,
        )
        .use_alpha(false);

    if rotation.is_identity() {
        let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out_side, plan.out_side, &mut dst[..dst_len])?;
        resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;
        return Ok(());
    }

    staging.ensure_len(dst_len);
    {
        let mut square = TypedImage::<U8x4>::from_buffer(plan.out_side, plan.out_side, &mut staging.buf[..dst_len])?;
        resizer.resize_typed::<U8x4>(&src_view, &mut square, &opts)?;
    }

    // --- Rotate into the caller's canvas ---
    rotate_square_bgra(&staging.buf[..dst_len], plan.out_side, rotation, &mut dst[..dst_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_square_plan, Size};

    /// Left half blue, right half red (BGRA).
    fn split_frame(w: u32, h: u32) -> Vec<u8> {
        let mut data = vec![0u8; (w * h * 4) as usize];
        for y in 0..h {
            for x in 0..w {
                let i = ((y * w + x) * 4) as usize;
                let px = if x < w / 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
                data[i..i + 4].copy_from_slice(&px);
            }
        }
        data
    }

    fn pixel(buf: &[u8], side: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * side + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn rescales_center_square_without_rotation() {
        let input = Size { w: 64, h: 32 };
        let src = split_frame(input.w, input.h);
        let plan = build_square_plan(input, 16);
        let mut resizer = Resizer::new();
        let mut staging = Staging::with_capacity(0);
        let mut dst = vec![0u8; plan.out_len_bgra()];

        crop_and_rescale_bgra(&mut resizer, &src, &plan, Rotation::Deg0, &mut staging, &mut dst).unwrap();

        // Left edge stays blue, right edge stays red
        assert_eq!(pixel(&dst, 16, 0, 8)[0], 255);
        assert_eq!(pixel(&dst, 16, 15, 8)[2], 255);
        assert!(staging.as_slice().is_empty());
    }

    #[test]
    fn quarter_turn_moves_left_half_to_top() {
        let input = Size { w: 32, h: 32 };
        let src = split_frame(input.w, input.h);
        let plan = build_square_plan(input, 8);
        let mut resizer = Resizer::new();
        let mut staging = Staging::with_capacity(plan.out_len_bgra());
        let mut dst = vec![0u8; plan.out_len_bgra()];

        crop_and_rescale_bgra(&mut resizer, &src, &plan, Rotation::Deg90, &mut staging, &mut dst).unwrap();

        // Clockwise: the former left (blue) half becomes the top half
        assert_eq!(pixel(&dst, 8, 4, 0)[0], 255);
        assert_eq!(pixel(&dst, 8, 4, 7)[2], 255);
    }

    #[test]
    fn undersized_destination_is_rejected() {
        let input = Size { w: 8, h: 8 };
        let src = split_frame(8, 8);
        let plan = build_square_plan(input, 8);
        let mut dst = vec![0u8; 16];
        let err = crop_and_rescale_bgra(
            &mut Resizer::new(),
            &src,
            &plan,
            Rotation::Deg0,
            &mut Staging::with_capacity(0),
            &mut dst,
        )
        .unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall));
    }
}

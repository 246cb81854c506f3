//! Default square crop/rescale backed by `preview_scale::cpu`.

use fast_image_resize::Resizer;
use preview_scale::cpu::{crop_and_rescale_bgra, Staging};
use preview_scale::plan::{build_square_plan, Size};
use preview_scale::rotate::Rotation;

use crate::core::output_image::OutputImage;
use crate::core::scratch::Pixel;
use crate::error::{PreviewError, PreviewResult};
use crate::processing::processing::CropRescaler;

/// Centered square crop, SIMD rescale, then rotation.
///
/// The resizer, the rotation staging buffer and the BGRA canvas are kept
/// between frames; only the returned [`OutputImage`] is allocated per frame.
pub struct SquareCropRescaler {
    resizer: Resizer,
    staging: Staging,
    canvas: Vec<u8>,
}

impl Default for SquareCropRescaler {
    fn default() -> Self {
        Self::new()
    }
}

impl SquareCropRescaler {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            staging: Staging::with_capacity(0),
            canvas: Vec::new(),
        }
    }
}

impl CropRescaler for SquareCropRescaler {
    fn crop_and_rescale(
        &mut self,
        pixels: &[Pixel],
        width: u32,
        height: u32,
        output_size: u32,
        rotation: Rotation,
    ) -> PreviewResult<OutputImage> {
        let count = width as usize * height as usize;
        if count == 0 || pixels.len() < count {
            return Err(PreviewError::rescale(format!(
                "{} pixels available for a {}x{} frame",
                pixels.len(),
                width,
                height
            ))
            .with_operation("crop_and_rescale"));
        }

        let plan = build_square_plan(Size { w: width, h: height }, output_size);
        let len = plan.out_len_bgra();
        if self.canvas.len() != len {
            self.canvas.resize(len, 0);
        }

        crop_and_rescale_bgra(
            &mut self.resizer,
            bytemuck::cast_slice(&pixels[..count]),
            &plan,
            rotation,
            &mut self.staging,
            &mut self.canvas,
        )
        .map_err(|e| {
            PreviewError::from(e)
                .with_operation("crop_and_rescale")
                .with_metadata("rotation", rotation.degrees().to_string())
        })?;

        OutputImage::from_bgra(&self.canvas, plan.out_side, 0)
    }
}

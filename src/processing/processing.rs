//! # Frame Processing Contracts
//!
//! The pipeline converts each admitted frame in two steps, each behind a trait
//! so embedding applications can plug in their own kernels (GPU, vendor
//! libraries, test doubles):
//!
//! 1. **FrameDecoder**: raw YUV 4:2:0 planes → flat BGRA8 pixel buffer in the
//!    scratch buffers, sized `width × height`
//! 2. **CropRescaler**: flat pixel buffer → fresh `output_size × output_size`
//!    [`OutputImage`], rotated by the sensor orientation
//!
//! Both run on the frame-delivery context while the single-flight token is
//! held, so implementations never see concurrent calls. Errors are reported
//! through [`PreviewResult`]; the pipeline turns them into dropped frames.

use preview_scale::rotate::Rotation;

use crate::capture::frame::YuvPlanes;
use crate::core::output_image::OutputImage;
use crate::core::scratch::{Pixel, ScratchBuffers};
use crate::error::PreviewResult;

/// Converts a raw multi-plane frame into the scratch pixel buffer.
pub trait FrameDecoder: Send {
    /// Decode `planes` of a `width × height` frame into `scratch.pixels_mut()`.
    ///
    /// `scratch` has already been sized for this resolution. Its plane caches
    /// may be used to copy plane bytes out of the native buffer.
    fn decode(
        &mut self,
        planes: YuvPlanes<'_>,
        width: u32,
        height: u32,
        scratch: &mut ScratchBuffers,
    ) -> PreviewResult<()>;
}

/// Produces the square, rotated output image from decoded pixels.
pub trait CropRescaler: Send {
    /// `pixels` holds exactly `width × height` BGRA8 pixels.
    fn crop_and_rescale(
        &mut self,
        pixels: &[Pixel],
        width: u32,
        height: u32,
        output_size: u32,
        rotation: Rotation,
    ) -> PreviewResult<OutputImage>;
}

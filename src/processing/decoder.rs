//! Default YUV 4:2:0 decoder backed by `preview_scale::yuv`.

use preview_scale::yuv::{yuv420_to_bgra, PlaneRef};

use crate::capture::frame::YuvPlanes;
use crate::core::scratch::ScratchBuffers;
use crate::error::{PreviewError, PreviewResult};
use crate::processing::processing::FrameDecoder;

/// CPU decoder for three-plane YUV 4:2:0 frames.
///
/// Plane bytes are first copied into the scratch plane caches, then converted
/// from there. The caches keep their capacity between frames, so steady-state
/// decoding does not allocate.
#[derive(Debug, Default)]
pub struct Yuv420Decoder;

impl Yuv420Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for Yuv420Decoder {
    fn decode(
        &mut self,
        planes: YuvPlanes<'_>,
        width: u32,
        height: u32,
        scratch: &mut ScratchBuffers,
    ) -> PreviewResult<()> {
        if scratch.dimensions() != (width, height) {
            return Err(PreviewError::resource(
                "scratch buffers",
                format!(
                    "sized for {:?}, frame is {}x{}",
                    scratch.dimensions(),
                    width,
                    height
                ),
            )
            .with_operation("decode"));
        }

        let src = planes.as_array();
        let (caches, pixels) = scratch.split_mut();
        for (cache, plane) in caches.iter_mut().zip(src.iter()) {
            cache.clear();
            cache.extend_from_slice(plane.data);
        }

        let cached = |i: usize| PlaneRef {
            data: caches[i].as_slice(),
            row_stride: src[i].row_stride,
            pixel_stride: src[i].pixel_stride,
        };

        yuv420_to_bgra(cached(0), cached(1), cached(2), width, height, pixels)
            .map_err(|e| PreviewError::from(e).with_operation("decode"))
    }
}

//! Square RGBA output image produced once per admitted frame.

use image::RgbaImage;

use crate::error::{PreviewError, PreviewResult};

/// Display-ready square image.
///
/// Images are shared as `Arc<OutputImage>` between the display context and
/// consumers of the latest image; memory is returned when the last holder drops.
#[derive(Debug, Clone)]
pub struct OutputImage {
    image: RgbaImage,
    sequence: u64,
}

impl OutputImage {
    /// Wrap an RGBA image produced for frame number `sequence`.
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    /// Build from a tightly packed BGRA8 buffer of `side × side` pixels.
    pub fn from_bgra(bgra: &[u8], side: u32, sequence: u64) -> PreviewResult<Self> {
        let len = side as usize * side as usize * 4;
        if bgra.len() < len {
            return Err(PreviewError::rescale(format!(
                "expected {} BGRA bytes for a {}x{} image, got {}",
                len,
                side,
                side,
                bgra.len()
            )));
        }

        let mut rgba = bgra[..len].to_vec();
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        let image = RgbaImage::from_raw(side, side, rgba)
            .ok_or_else(|| PreviewError::rescale("RGBA buffer does not match image size"))?;
        Ok(Self { image, sequence })
    }

    /// Stamp the frame number, for rescalers that do not know it.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Monotonic number of the frame this image was produced from.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_is_swizzled_to_rgba() {
        let bgra = [10u8, 20, 30, 255].repeat(4);
        let img = OutputImage::from_bgra(&bgra, 2, 7).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.sequence(), 7);
        assert_eq!(img.as_rgba().get_pixel(1, 1).0, [30, 20, 10, 255]);
    }

    #[test]
    fn into_rgba_keeps_pixels() {
        let bgra = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let rgba = OutputImage::from_bgra(&bgra, 2, 0).unwrap().into_rgba();
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(rgba.as_raw(), &vec![3, 2, 1, 4, 7, 6, 5, 8, 11, 10, 9, 12, 15, 14, 13, 16]);
    }

    #[test]
    fn short_buffer_is_an_error() {
        let err = OutputImage::from_bgra(&[0u8; 8], 2, 0).unwrap_err();
        assert_eq!(err.category(), "rescale");
    }
}

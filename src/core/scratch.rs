//! # Scratch Buffer Module
//!
//! Resolution-sized intermediate buffers for frame decoding. The decoder writes
//! every frame into the same flat pixel buffer and per-plane caches, so the hot
//! path never allocates while the camera resolution stays the same.
//!
//! ## Overview
//!
//! - **Problem**: per-frame allocation of `width × height` buffers at camera rate
//! - **Solution**: allocate once per resolution, reuse until the resolution changes
//! - **Guarantee**: after a resize the pixel buffer is zero-filled and sized for the
//!   new resolution, so stale contents from a previous resolution are never read
//!
//! The plane caches are capacity-only: they start empty with room for tightly
//! packed planes, and the decoder refills them from the raw frame every time.
//! Padded or interleaved planes grow a cache once per resolution; after that
//! `clear` keeps the capacity and steady-state frames do not allocate.
//!
//! ## Example
//!
//! ```rust
//! use photobooth_preview::core::scratch::ScratchBuffers;
//!
//! let mut scratch = ScratchBuffers::new();
//! assert!(scratch.ensure_capacity(640, 480));   // first frame allocates
//! assert!(!scratch.ensure_capacity(640, 480));  // same resolution is a no-op
//! assert_eq!(scratch.pixels().len(), 640 * 480);
//! assert_eq!(scratch.reallocations(), 1);
//! ```

/// Number of planes in a YUV 4:2:0 frame.
pub const PLANE_COUNT: usize = 3;

/// One BGRA8 pixel.
pub type Pixel = [u8; 4];

/// Flat pixel buffer plus per-plane byte caches for one input resolution.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    width: u32,
    height: u32,
    /// Whether `width × height` reflects an allocation
    sized: bool,
    /// Decoded frame, one pixel per input pixel
    pixels: Vec<Pixel>,
    /// Raw plane bytes copied out of the frame before it is released; empty
    /// until a decoder fills them
    planes: [Vec<u8>; PLANE_COUNT],
    reallocations: u64,
}

impl ScratchBuffers {
    /// Creates an empty set of buffers. Nothing is allocated until the first frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the buffers fit a `width × height` frame.
    ///
    /// Returns `true` when the buffers were (re)allocated, `false` when the
    /// resolution matches the previous call and the buffers were kept.
    pub fn ensure_capacity(&mut self, width: u32, height: u32) -> bool {
        if self.sized && self.width == width && self.height == height {
            return false;
        }

        let pixel_count = width as usize * height as usize;
        let chroma_count = (width as usize).div_ceil(2) * (height as usize).div_ceil(2);

        // Fresh vectors, not resize: resize keeps the old prefix around
        self.pixels = vec![[0u8; 4]; pixel_count];
        self.planes = [
            Vec::with_capacity(pixel_count),
            Vec::with_capacity(chroma_count),
            Vec::with_capacity(chroma_count),
        ];
        self.width = width;
        self.height = height;
        self.sized = true;
        self.reallocations += 1;
        true
    }

    /// Forget the current resolution so the next `ensure_capacity` reallocates.
    ///
    /// Used after a faulted frame, when buffer contents can no longer be trusted.
    pub fn invalidate(&mut self) {
        self.width = 0;
        self.height = 0;
        self.sized = false;
        self.pixels = Vec::new();
        self.planes = Default::default();
    }

    /// Resolution the buffers are currently sized for.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Byte view of the pixel buffer (BGRA8, tightly packed).
    pub fn pixel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Plane caches and pixel buffer borrowed together, for decoders that copy
    /// plane bytes first and convert second.
    pub fn split_mut(&mut self) -> (&mut [Vec<u8>; PLANE_COUNT], &mut [Pixel]) {
        (&mut self.planes, &mut self.pixels)
    }

    /// Bytes the decoder last copied into plane `index`.
    pub fn plane_cache(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(Vec::as_slice)
    }

    pub fn plane_capacity(&self, index: usize) -> Option<usize> {
        self.planes.get(index).map(Vec::capacity)
    }

    /// How many times buffers have been (re)allocated.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}

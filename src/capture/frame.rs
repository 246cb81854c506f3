//! # Raw Frames and Frame Leases
//!
//! A raw frame is a handle to a native multi-plane buffer owned by the frame
//! source. Native buffers are scarce (the source typically has a handful), so
//! every frame handed out must be released exactly once, and promptly, no
//! matter how processing ends.
//!
//! [`FrameLease`] enforces that: it owns the frame, releases it on an explicit
//! [`FrameLease::release`] call or when dropped, and never releases twice.

use preview_scale::yuv::PlaneRef;

/// The three planes of a YUV 4:2:0 frame.
#[derive(Clone, Copy, Debug)]
pub struct YuvPlanes<'a> {
    pub y: PlaneRef<'a>,
    pub u: PlaneRef<'a>,
    pub v: PlaneRef<'a>,
}

impl<'a> YuvPlanes<'a> {
    pub fn as_array(&self) -> [PlaneRef<'a>; 3] {
        [self.y, self.u, self.v]
    }
}

/// Handle to a native multi-plane pixel buffer in YUV 4:2:0 encoding.
pub trait RawFrame {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Plane views. Only valid until `release` is called.
    fn planes(&self) -> YuvPlanes<'_>;

    /// Return the buffer to the frame source.
    fn release(&mut self);
}

/// Source of raw frames, such as a camera image reader.
pub trait FrameSource: Send + Sync {
    type Frame: RawFrame;

    /// Take the most recent pending frame, discarding older ones.
    fn acquire_latest_frame(&self) -> Option<Self::Frame>;
}

/// Owning guard that releases its frame exactly once.
pub struct FrameLease<F: RawFrame> {
    frame: Option<F>,
    width: u32,
    height: u32,
}

impl<F: RawFrame> FrameLease<F> {
    pub fn new(frame: F) -> Self {
        let (width, height) = (frame.width(), frame.height());
        Self {
            frame: Some(frame),
            width,
            height,
        }
    }

    /// Width of the leased frame. Still available after release.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the leased frame. Still available after release.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Plane views, or `None` once the frame has been released.
    pub fn planes(&self) -> Option<YuvPlanes<'_>> {
        self.frame.as_ref().map(RawFrame::planes)
    }

    pub fn is_released(&self) -> bool {
        self.frame.is_none()
    }

    /// Release the frame now. Later calls, and the eventual drop, do nothing.
    pub fn release(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            frame.release();
        }
    }
}

impl<F: RawFrame> Drop for FrameLease<F> {
    fn drop(&mut self) {
        self.release();
    }
}

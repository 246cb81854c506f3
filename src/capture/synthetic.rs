//! # Synthetic Frame Source
//!
//! In-memory stand-in for a camera image reader. Produces YUV 4:2:0 frames
//! with a moving diagonal gradient, either with planar chroma or with
//! interleaved VU chroma (the layout most phone camera HALs deliver), and
//! optional row padding.
//!
//! Frames are produced on demand: `push_frames` marks frames as pending, and
//! `acquire_latest_frame` collapses everything pending into the newest frame,
//! like a reader that only keeps the latest image.
//!
//! Every frame reports back to a shared [`ReleaseTracker`], which is how the
//! tests and the CLI demo verify that no frame leaks or is released twice.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use preview_scale::yuv::PlaneRef;

use crate::capture::frame::{FrameSource, RawFrame, YuvPlanes};

/// How chroma samples are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaLayout {
    /// Separate U and V planes, pixel stride 1
    Planar,
    /// One VU-interleaved buffer, pixel stride 2
    #[default]
    Interleaved,
}

/// Release bookkeeping shared by a source and all of its frames.
#[derive(Debug, Default)]
pub struct ReleaseTracker {
    acquired: AtomicU64,
    released: AtomicU64,
    double_released: AtomicU64,
    leaked: AtomicU64,
}

impl ReleaseTracker {
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Frames that had `release` called more than once.
    pub fn double_released(&self) -> u64 {
        self.double_released.load(Ordering::SeqCst)
    }

    /// Frames dropped without ever being released.
    pub fn leaked(&self) -> u64 {
        self.leaked.load(Ordering::SeqCst)
    }

    /// Every acquired frame was released exactly once.
    pub fn balanced(&self) -> bool {
        self.acquired() == self.released() && self.double_released() == 0 && self.leaked() == 0
    }
}

/// One synthetic YUV 4:2:0 frame.
#[derive(Debug)]
pub struct SyntheticFrame {
    width: u32,
    height: u32,
    sequence: u64,
    layout: ChromaLayout,
    y: Vec<u8>,
    /// Planar: U then V, each `chroma_stride * chroma_rows`. Interleaved: VU pairs.
    chroma: Vec<u8>,
    y_stride: usize,
    chroma_stride: usize,
    released: bool,
    tracker: Arc<ReleaseTracker>,
}

impl SyntheticFrame {
    fn generate(
        width: u32,
        height: u32,
        sequence: u64,
        layout: ChromaLayout,
        row_padding: usize,
        tracker: Arc<ReleaseTracker>,
    ) -> Self {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        let shift = (sequence as usize).wrapping_mul(4);

        let y_stride = w + row_padding;
        let mut y = vec![0u8; y_stride * h];
        for row in 0..h {
            for col in 0..w {
                let ramp = (col + row + shift) % 220;
                y[row * y_stride + col] = 16 + ramp as u8;
            }
        }

        let (chroma_stride, chroma) = match layout {
            ChromaLayout::Planar => {
                let stride = cw + row_padding;
                let mut buf = vec![128u8; stride * ch * 2];
                let (u, v) = buf.split_at_mut(stride * ch);
                for row in 0..ch {
                    for col in 0..cw {
                        u[row * stride + col] = chroma_sample(col, cw);
                        v[row * stride + col] = chroma_sample(row, ch);
                    }
                }
                (stride, buf)
            }
            ChromaLayout::Interleaved => {
                let stride = cw * 2 + row_padding;
                let mut buf = vec![128u8; stride * ch];
                for row in 0..ch {
                    for col in 0..cw {
                        buf[row * stride + col * 2] = chroma_sample(row, ch);
                        buf[row * stride + col * 2 + 1] = chroma_sample(col, cw);
                    }
                }
                (stride, buf)
            }
        };

        tracker.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            width,
            height,
            sequence,
            layout,
            y,
            chroma,
            y_stride,
            chroma_stride,
            released: false,
            tracker,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

fn chroma_sample(pos: usize, span: usize) -> u8 {
    (64 + (pos * 128) / span.max(1)) as u8
}

impl RawFrame for SyntheticFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn planes(&self) -> YuvPlanes<'_> {
        let y = PlaneRef {
            data: &self.y,
            row_stride: self.y_stride,
            pixel_stride: 1,
        };
        match self.layout {
            ChromaLayout::Planar => {
                let (u, v) = self.chroma.split_at(self.chroma.len() / 2);
                YuvPlanes {
                    y,
                    u: PlaneRef {
                        data: u,
                        row_stride: self.chroma_stride,
                        pixel_stride: 1,
                    },
                    v: PlaneRef {
                        data: v,
                        row_stride: self.chroma_stride,
                        pixel_stride: 1,
                    },
                }
            }
            ChromaLayout::Interleaved => YuvPlanes {
                y,
                u: PlaneRef {
                    data: self.chroma.get(1..).unwrap_or(&[]),
                    row_stride: self.chroma_stride,
                    pixel_stride: 2,
                },
                v: PlaneRef {
                    data: &self.chroma,
                    row_stride: self.chroma_stride,
                    pixel_stride: 2,
                },
            },
        }
    }

    fn release(&mut self) {
        if self.released {
            self.tracker.double_released.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.released = true;
        self.tracker.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for SyntheticFrame {
    fn drop(&mut self) {
        if !self.released {
            self.tracker.leaked.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Frame source producing [`SyntheticFrame`]s.
#[derive(Debug)]
pub struct SyntheticFrameSource {
    width: AtomicU32,
    height: AtomicU32,
    layout: ChromaLayout,
    row_padding: usize,
    pending: AtomicU64,
    sequence: AtomicU64,
    tracker: Arc<ReleaseTracker>,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            layout: ChromaLayout::default(),
            row_padding: 0,
            pending: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            tracker: Arc::new(ReleaseTracker::default()),
        }
    }

    pub fn with_layout(mut self, layout: ChromaLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Pad every plane row with `bytes` unused bytes.
    pub fn with_row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    /// Change the resolution of frames produced from now on.
    pub fn set_resolution(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::SeqCst);
        self.height.store(height, Ordering::SeqCst);
    }

    /// Mark `count` new frames as available.
    pub fn push_frames(&self, count: u64) {
        self.pending.fetch_add(count, Ordering::SeqCst);
    }

    pub fn tracker(&self) -> Arc<ReleaseTracker> {
        self.tracker.clone()
    }
}

impl FrameSource for SyntheticFrameSource {
    type Frame = SyntheticFrame;

    fn acquire_latest_frame(&self) -> Option<SyntheticFrame> {
        let skipped = self.pending.swap(0, Ordering::SeqCst);
        if skipped == 0 {
            return None;
        }
        let sequence = self.sequence.fetch_add(skipped, Ordering::SeqCst) + skipped - 1;
        Some(SyntheticFrame::generate(
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
            sequence,
            self.layout,
            self.row_padding,
            self.tracker.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pending_frames_yields_none() {
        let source = SyntheticFrameSource::new(8, 8);
        assert!(source.acquire_latest_frame().is_none());
        assert_eq!(source.tracker().acquired(), 0);
    }

    #[test]
    fn pending_frames_collapse_into_latest() {
        let source = SyntheticFrameSource::new(8, 8);
        source.push_frames(3);
        let mut frame = source.acquire_latest_frame().unwrap();
        assert_eq!(frame.sequence(), 2);
        assert!(source.acquire_latest_frame().is_none());
        frame.release();
        assert!(source.tracker().balanced());
    }

    #[test]
    fn tracker_detects_leaks_and_double_releases() {
        let source = SyntheticFrameSource::new(4, 4);
        source.push_frames(1);
        drop(source.acquire_latest_frame());
        assert_eq!(source.tracker().leaked(), 1);

        source.push_frames(1);
        let mut frame = source.acquire_latest_frame().unwrap();
        frame.release();
        frame.release();
        assert_eq!(source.tracker().double_released(), 1);
        assert!(!source.tracker().balanced());
    }

    #[test]
    fn planes_cover_declared_strides() {
        for layout in [ChromaLayout::Planar, ChromaLayout::Interleaved] {
            let source = SyntheticFrameSource::new(7, 5)
                .with_layout(layout)
                .with_row_padding(3);
            source.push_frames(1);
            let mut frame = source.acquire_latest_frame().unwrap();
            let planes = frame.planes();
            assert!(planes.y.data.len() >= planes.y.required_len(7, 5));
            assert!(planes.u.data.len() >= planes.u.required_len(4, 3));
            assert!(planes.v.data.len() >= planes.v.required_len(4, 3));
            frame.release();
        }
    }

    #[test]
    fn empty_frames_expose_empty_planes() {
        for (width, height) in [(0, 0), (0, 6), (6, 0)] {
            for layout in [ChromaLayout::Planar, ChromaLayout::Interleaved] {
                let source = SyntheticFrameSource::new(width, height).with_layout(layout);
                source.push_frames(1);
                let mut frame = source.acquire_latest_frame().unwrap();
                let planes = frame.planes();
                assert!(planes.u.data.is_empty());
                assert!(planes.v.data.is_empty());
                frame.release();
            }
        }
    }
}

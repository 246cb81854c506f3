//! Common test utilities and helpers for the preview pipeline tests
//!
//! This module provides latches for stepping concurrent scenarios, kernels
//! that block or fail on demand, and display sinks that record what they see.

#![allow(dead_code)]

/// One-shot latch for coordinating test threads
pub mod latch {
    use std::sync::{Condvar, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    pub struct Latch {
        open: Mutex<bool>,
        cond: Condvar,
    }

    impl Latch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open(&self) {
            *self.open.lock().unwrap() = true;
            self.cond.notify_all();
        }

        pub fn is_open(&self) -> bool {
            *self.open.lock().unwrap()
        }

        /// Block until opened; panics after five seconds so a broken test cannot hang.
        pub fn wait(&self) {
            let guard = self.open.lock().unwrap();
            let (guard, timeout) = self
                .cond
                .wait_timeout_while(guard, Duration::from_secs(5), |open| !*open)
                .unwrap();
            assert!(*guard && !timeout.timed_out(), "latch was never opened");
        }
    }
}

/// Decoders and rescalers with scripted behavior
pub mod mock_kernels {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    use photobooth_preview::capture::YuvPlanes;
    use photobooth_preview::core::scratch::{Pixel, ScratchBuffers};
    use photobooth_preview::processing::{
        CropRescaler, FrameDecoder, Rotation, SquareCropRescaler, Yuv420Decoder,
    };
    use photobooth_preview::{OutputImage, PreviewError, PreviewResult};

    use super::latch::Latch;

    /// On one chosen call, signals `entered` and waits for `release` before decoding.
    pub struct BlockingDecoder {
        pub entered: Arc<Latch>,
        pub release: Arc<Latch>,
        pub calls: Arc<AtomicU32>,
        blocking_call: u32,
        inner: Yuv420Decoder,
    }

    impl BlockingDecoder {
        /// Blocks on the first call.
        pub fn new() -> Self {
            Self::blocking_on(0)
        }

        /// Blocks on the call with zero-based index `call`.
        pub fn blocking_on(call: u32) -> Self {
            Self {
                entered: Arc::new(Latch::new()),
                release: Arc::new(Latch::new()),
                calls: Arc::new(AtomicU32::new(0)),
                blocking_call: call,
                inner: Yuv420Decoder::new(),
            }
        }
    }

    impl FrameDecoder for BlockingDecoder {
        fn decode(
            &mut self,
            planes: YuvPlanes<'_>,
            width: u32,
            height: u32,
            scratch: &mut ScratchBuffers,
        ) -> PreviewResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.blocking_call {
                self.entered.open();
                self.release.wait();
            }
            self.inner.decode(planes, width, height, scratch)
        }
    }

    /// Fails the first `failures` calls, then decodes normally.
    pub struct FailingDecoder {
        failures: u32,
        pub calls: Arc<AtomicU32>,
        inner: Yuv420Decoder,
    }

    impl FailingDecoder {
        pub fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Arc::new(AtomicU32::new(0)),
                inner: Yuv420Decoder::new(),
            }
        }
    }

    impl FrameDecoder for FailingDecoder {
        fn decode(
            &mut self,
            planes: YuvPlanes<'_>,
            width: u32,
            height: u32,
            scratch: &mut ScratchBuffers,
        ) -> PreviewResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(PreviewError::decode("corrupt frame").with_operation("decode"));
            }
            self.inner.decode(planes, width, height, scratch)
        }
    }

    /// Panics on the first call, then decodes normally.
    pub struct PanicOnceDecoder {
        panicked: bool,
        inner: Yuv420Decoder,
    }

    impl PanicOnceDecoder {
        pub fn new() -> Self {
            Self {
                panicked: false,
                inner: Yuv420Decoder::new(),
            }
        }
    }

    impl FrameDecoder for PanicOnceDecoder {
        fn decode(
            &mut self,
            planes: YuvPlanes<'_>,
            width: u32,
            height: u32,
            scratch: &mut ScratchBuffers,
        ) -> PreviewResult<()> {
            if !self.panicked {
                self.panicked = true;
                panic!("decoder blew up");
            }
            self.inner.decode(planes, width, height, scratch)
        }
    }

    /// Tracks how many decodes overlap, holding each one open briefly.
    pub struct OverlapDecoder {
        pub in_flight: Arc<AtomicU32>,
        pub max_in_flight: Arc<AtomicU32>,
        hold: Duration,
        inner: Yuv420Decoder,
    }

    impl OverlapDecoder {
        pub fn new(hold: Duration) -> Self {
            Self {
                in_flight: Arc::new(AtomicU32::new(0)),
                max_in_flight: Arc::new(AtomicU32::new(0)),
                hold,
                inner: Yuv420Decoder::new(),
            }
        }
    }

    impl FrameDecoder for OverlapDecoder {
        fn decode(
            &mut self,
            planes: YuvPlanes<'_>,
            width: u32,
            height: u32,
            scratch: &mut ScratchBuffers,
        ) -> PreviewResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.hold);
            let result = self.inner.decode(planes, width, height, scratch);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    /// Fails the first `failures` calls, then crops and rescales normally.
    pub struct FailingRescaler {
        failures: u32,
        pub calls: Arc<AtomicU32>,
        inner: SquareCropRescaler,
    }

    impl FailingRescaler {
        pub fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Arc::new(AtomicU32::new(0)),
                inner: SquareCropRescaler::new(),
            }
        }
    }

    impl CropRescaler for FailingRescaler {
        fn crop_and_rescale(
            &mut self,
            pixels: &[Pixel],
            width: u32,
            height: u32,
            output_size: u32,
            rotation: Rotation,
        ) -> PreviewResult<OutputImage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(PreviewError::rescale("resize kernel rejected the frame"));
            }
            self.inner
                .crop_and_rescale(pixels, width, height, output_size, rotation)
        }
    }
}

/// Display sinks for observing the display context
pub mod mock_sinks {
    use std::sync::{Arc, Mutex};

    use photobooth_preview::{DisplaySink, OutputImage, PreviewError, PreviewResult};

    use super::latch::Latch;

    /// Records the sequence number and size of every rendered image.
    #[derive(Default)]
    pub struct RecordingSink {
        rendered: Mutex<Vec<(u64, u32, u32)>>,
    }

    impl RecordingSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn sequences(&self) -> Vec<u64> {
            self.rendered.lock().unwrap().iter().map(|r| r.0).collect()
        }

        pub fn sizes(&self) -> Vec<(u32, u32)> {
            self.rendered.lock().unwrap().iter().map(|r| (r.1, r.2)).collect()
        }

        pub fn count(&self) -> usize {
            self.rendered.lock().unwrap().len()
        }
    }

    impl DisplaySink for RecordingSink {
        fn render_image(&self, image: Arc<OutputImage>) -> PreviewResult<()> {
            self.rendered
                .lock()
                .unwrap()
                .push((image.sequence(), image.width(), image.height()));
            Ok(())
        }
    }

    /// Blocks inside `render_image` until `release` is opened.
    #[derive(Default)]
    pub struct GatedSink {
        pub entered: Latch,
        pub release: Latch,
        pub inner: RecordingSink,
    }

    impl GatedSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }
    }

    impl DisplaySink for GatedSink {
        fn render_image(&self, image: Arc<OutputImage>) -> PreviewResult<()> {
            self.entered.open();
            self.release.wait();
            self.inner.render_image(image)
        }
    }

    /// A view that has been detached from its window.
    pub struct DetachedSink;

    impl DisplaySink for DetachedSink {
        fn render_image(&self, _image: Arc<OutputImage>) -> PreviewResult<()> {
            Err(PreviewError::sink_unavailable("view detached"))
        }
    }
}

//! # Preview Pipeline
//!
//! Per-frame orchestration between the camera frame source and the display.
//!
//! ## Architecture
//!
//! 1. **Single-flight gate**: at most one frame is processed at any time;
//!    frames arriving meanwhile are released and dropped immediately
//! 2. **Scratch buffers**: decode buffers are reused across frames and only
//!    reallocated when the frame resolution changes
//! 3. **Processing**: [`FrameDecoder`] then [`CropRescaler`], both pluggable
//! 4. **Display dispatch**: the output image is handed to the display context
//!    without waiting for it to be rendered
//! 5. **Mode toggle**: outside preview mode every frame is dropped
//!
//! ## Concurrency
//!
//! `on_frame` may be called from any number of frame-delivery threads. The busy
//! token is an `AtomicBool` taken with a compare-and-swap and returned by an
//! RAII guard on every exit path, including panics inside the kernels. The
//! scratch buffers and kernels sit behind a mutex that is only locked while the
//! token is held, so it is never contended.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use photobooth_preview::capture::SyntheticFrameSource;
//! use photobooth_preview::config::PreviewConfig;
//! use photobooth_preview::core::output_image::OutputImage;
//! use photobooth_preview::display::DisplaySink;
//! use photobooth_preview::error::PreviewResult;
//! use photobooth_preview::pipeline::PreviewPipeline;
//!
//! struct View;
//! impl DisplaySink for View {
//!     fn render_image(&self, _image: Arc<OutputImage>) -> PreviewResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> PreviewResult<()> {
//! let view = Arc::new(View);
//! let (pipeline, _worker) = PreviewPipeline::builder()
//!     .with_config(PreviewConfig::new(90, 480, 16))
//!     .with_sink(&view)
//!     .build()?;
//!
//! let source = SyntheticFrameSource::new(640, 480);
//! source.push_frames(1);
//! pipeline.on_frame(&source);
//! pipeline.flush_display().await?;
//! assert_eq!(pipeline.latest_image().map(|img| img.width()), Some(480));
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use preview_scale::rotate::Rotation;
use tokio::runtime::Handle;
use tracing::{debug, debug_span, info};

use crate::capture::frame::{FrameLease, FrameSource, RawFrame};
use crate::config::PreviewConfig;
use crate::core::diagnostics::{PipelineEvent, PipelineStats, StatsSnapshot};
use crate::core::latest_frame::LatestFrame;
use crate::core::output_image::OutputImage;
use crate::core::scratch::ScratchBuffers;
use crate::display::{DisplayDispatcher, DisplaySink, DisplayWorker};
use crate::error::{PreviewError, PreviewResult};
use crate::processing::{CropRescaler, FrameDecoder, SquareCropRescaler, Yuv420Decoder};

/// State read by both the frame-delivery and display contexts.
pub(crate) struct Shared {
    preview_mode: AtomicBool,
    pub(crate) latest: LatestFrame,
    pub(crate) stats: PipelineStats,
}

impl Shared {
    pub(crate) fn preview_mode(&self) -> bool {
        self.preview_mode.load(Ordering::Acquire)
    }
}

/// What `on_frame` did with one frame-available notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The source had nothing pending.
    NoFrame,
    /// Preview mode was off; the frame was released unprocessed.
    DroppedNotPreviewing,
    /// Another frame was in flight; the frame was released unprocessed.
    DroppedBusy,
    /// An output image was produced. `dispatched` is false when the display
    /// handoff dropped it.
    Processed { sequence: u64, dispatched: bool },
    /// Decode or rescale failed; the frame was released and dropped.
    Failed,
}

/// Point-in-time view of the gate, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub preview_mode: bool,
    pub busy: bool,
    /// Resolution the scratch buffers are sized for; `(0, 0)` before the first frame.
    pub last_width: u32,
    pub last_height: u32,
    pub sensor_orientation: u32,
}

/// Scratch buffers and kernels, touched only by the token holder.
struct Workbench {
    scratch: ScratchBuffers,
    decoder: Box<dyn FrameDecoder>,
    rescaler: Box<dyn CropRescaler>,
}

/// The busy token. Dropping it reopens the gate.
struct FlightToken<'a> {
    busy: &'a AtomicBool,
}

impl<'a> FlightToken<'a> {
    fn try_acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for FlightToken<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Camera preview pipeline.
pub struct PreviewPipeline {
    config: PreviewConfig,
    rotation: Rotation,
    busy: AtomicBool,
    last_width: AtomicU32,
    last_height: AtomicU32,
    next_sequence: AtomicU64,
    workbench: Mutex<Workbench>,
    shared: Arc<Shared>,
    dispatcher: DisplayDispatcher,
}

impl PreviewPipeline {
    /// Creates a new pipeline builder.
    pub fn builder() -> PreviewPipelineBuilder {
        PreviewPipelineBuilder::new()
    }

    /// Handle one frame-available notification from `source`.
    ///
    /// Never blocks on the display context. Every acquired frame is released
    /// exactly once before this returns, whatever the outcome.
    pub fn on_frame<S: FrameSource>(&self, source: &S) -> FrameOutcome {
        let stats = &self.shared.stats;

        let Some(frame) = source.acquire_latest_frame() else {
            stats.record(PipelineEvent::NoFrameAvailable);
            return FrameOutcome::NoFrame;
        };
        let mut lease = FrameLease::new(frame);

        if !self.shared.preview_mode() {
            lease.release();
            stats.record(PipelineEvent::DroppedNotPreviewing);
            return FrameOutcome::DroppedNotPreviewing;
        }

        let Some(_token) = FlightToken::try_acquire(&self.busy) else {
            lease.release();
            stats.record(PipelineEvent::DroppedBusy);
            return FrameOutcome::DroppedBusy;
        };

        stats.frame_admitted();
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let _span = debug_span!(
            "image_available",
            sequence,
            width = lease.width(),
            height = lease.height()
        )
        .entered();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process(&mut lease, sequence)));
        lease.release();

        match result {
            Ok(Ok(image)) => {
                stats.frame_processed();
                let dispatched = self.dispatcher.dispatch(image);
                FrameOutcome::Processed {
                    sequence,
                    dispatched,
                }
            }
            Ok(Err(error)) => {
                stats.record_failure(&error);
                FrameOutcome::Failed
            }
            Err(payload) => {
                self.reset_workbench();
                let error = PreviewError::state(
                    "processing",
                    "image_available",
                    format!("kernel panicked: {}", panic_message(payload.as_ref())),
                )
                .with_operation("image_available");
                stats.record_failure(&error);
                FrameOutcome::Failed
            }
        }
    }

    fn process<F: RawFrame>(
        &self,
        lease: &mut FrameLease<F>,
        sequence: u64,
    ) -> PreviewResult<Arc<OutputImage>> {
        let (width, height) = (lease.width(), lease.height());
        let mut bench = self.lock_workbench();
        let Workbench {
            scratch,
            decoder,
            rescaler,
        } = &mut *bench;

        if scratch.ensure_capacity(width, height) {
            self.last_width.store(width, Ordering::Relaxed);
            self.last_height.store(height, Ordering::Relaxed);
            self.shared.stats.scratch_reallocated();
            debug!(width, height, "scratch buffers reallocated");
        }

        let planes = lease
            .planes()
            .ok_or_else(|| PreviewError::resource("raw frame", "released before decode"))?;
        let decoded = decoder.decode(planes, width, height, scratch);
        // The native buffer is not needed past decoding.
        lease.release();
        decoded?;

        let image = rescaler.crop_and_rescale(
            scratch.pixels(),
            width,
            height,
            self.config.output_size,
            self.rotation,
        )?;
        Ok(Arc::new(image.with_sequence(sequence)))
    }

    fn lock_workbench(&self) -> MutexGuard<'_, Workbench> {
        self.workbench.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop scratch contents after a panic so the next frame starts clean.
    fn reset_workbench(&self) {
        self.workbench.clear_poison();
        self.lock_workbench().scratch.invalidate();
        self.last_width.store(0, Ordering::Relaxed);
        self.last_height.store(0, Ordering::Relaxed);
    }

    /// Enter or leave preview mode. Takes effect for the next admission
    /// decision and for updates that have not reached the display yet.
    pub fn set_preview_mode(&self, enabled: bool) {
        let previous = self.shared.preview_mode.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            info!(enabled, "preview mode changed");
        }
    }

    pub fn preview_mode(&self) -> bool {
        self.shared.preview_mode()
    }

    /// Whether a frame is being processed right now.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PipelineState {
        PipelineState {
            preview_mode: self.preview_mode(),
            busy: self.is_busy(),
            last_width: self.last_width.load(Ordering::Relaxed),
            last_height: self.last_height.load(Ordering::Relaxed),
            sensor_orientation: self.config.sensor_orientation,
        }
    }

    /// Most recently rendered image, if any.
    pub fn latest_image(&self) -> Option<Arc<OutputImage>> {
        self.shared.latest.get()
    }

    /// Release the held latest image, e.g. when the view is torn down.
    pub fn clear_latest_image(&self) {
        self.shared.latest.clear();
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Wait until every image dispatched so far has been rendered or dropped.
    pub async fn flush_display(&self) -> PreviewResult<()> {
        self.dispatcher.flush().await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Builder for [`PreviewPipeline`].
pub struct PreviewPipelineBuilder {
    config: PreviewConfig,
    decoder: Option<Box<dyn FrameDecoder>>,
    rescaler: Option<Box<dyn CropRescaler>>,
    sink: Option<Weak<dyn DisplaySink>>,
    runtime: Option<Handle>,
    preview_mode: bool,
}

impl Default for PreviewPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewPipelineBuilder {
    /// Defaults: default config, CPU kernels, no sink, preview mode on.
    pub fn new() -> Self {
        Self {
            config: PreviewConfig::default(),
            decoder: None,
            rescaler: None,
            sink: None,
            runtime: None,
            preview_mode: true,
        }
    }

    pub fn with_config(mut self, config: PreviewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_decoder<D: FrameDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    pub fn with_rescaler<R: CropRescaler + 'static>(mut self, rescaler: R) -> Self {
        self.rescaler = Some(Box::new(rescaler));
        self
    }

    /// Attach the display sink. Only a weak reference is kept; once the
    /// caller drops the sink, updates are dropped as sink unavailable.
    pub fn with_sink<S: DisplaySink>(mut self, sink: &Arc<S>) -> Self {
        let weak: Weak<dyn DisplaySink> = Arc::downgrade(sink) as Weak<S>;
        self.sink = Some(weak);
        self
    }

    /// Runtime that hosts the display worker. Defaults to the current one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Initial preview mode.
    pub fn with_preview_mode(mut self, enabled: bool) -> Self {
        self.preview_mode = enabled;
        self
    }

    /// Validate the configuration and start the display worker.
    pub fn build(self) -> PreviewResult<(PreviewPipeline, DisplayWorker)> {
        let config = self.config.validated()?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                PreviewError::state("no runtime", "build preview pipeline", e.to_string())
            })?,
        };

        let shared = Arc::new(Shared {
            preview_mode: AtomicBool::new(self.preview_mode),
            latest: LatestFrame::new(),
            stats: PipelineStats::new(),
        });
        let (dispatcher, worker) = DisplayDispatcher::spawn(
            self.sink,
            shared.clone(),
            config.display_queue_depth,
            &runtime,
        );

        info!(
            sensor_orientation = config.sensor_orientation,
            output_size = config.output_size,
            display_queue_depth = config.display_queue_depth,
            "preview pipeline ready"
        );

        let pipeline = PreviewPipeline {
            rotation: config.rotation(),
            config,
            busy: AtomicBool::new(false),
            last_width: AtomicU32::new(0),
            last_height: AtomicU32::new(0),
            next_sequence: AtomicU64::new(0),
            workbench: Mutex::new(Workbench {
                scratch: ScratchBuffers::new(),
                decoder: self
                    .decoder
                    .unwrap_or_else(|| Box::new(Yuv420Decoder::new())),
                rescaler: self
                    .rescaler
                    .unwrap_or_else(|| Box::new(SquareCropRescaler::new())),
            }),
            shared,
            dispatcher,
        };
        Ok((pipeline, worker))
    }
}

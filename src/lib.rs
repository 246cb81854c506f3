//! # Photobooth Preview Library
//!
//! Real-time camera preview pipeline: turns a stream of raw YUV 4:2:0 camera
//! frames into square, orientation-corrected preview images for a display.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `capture`: Raw frame handles, the frame source interface, a synthetic source
//! - `processing`: Decoder and crop/rescale contracts with CPU implementations
//! - `core`: Scratch buffers, the latest-image holder, output images, diagnostics
//! - `display`: Handoff of finished images to the display context
//! - `pipeline`: Single-flight per-frame orchestration and the preview mode toggle
//! - `config`: Configuration management and validation
//!
//! ## Features
//!
//! - **Drop, never queue**: frames arriving while one is in flight are released at once
//! - **Reused buffers**: decode buffers are reallocated only on resolution change
//! - **Non-blocking display handoff**: frame delivery never waits for rendering
//! - **Async/await**: the display context runs on Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use photobooth_preview::{run_preview, PreviewOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let options = PreviewOptions {
//!     width: 640,
//!     height: 480,
//!     frames: 120,
//!     fps: 30,
//!     delivery_threads: 1,
//!     save_latest: Some("latest.png".to_string()),
//!     config: Default::default(),
//! };
//!
//! let stats = run_preview(options).await?;
//! println!("{}", stats);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, trace};

pub mod capture;
pub mod config;
pub mod core;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod processing;

/// Re-export error types for convenience
pub use crate::error::{ErrorClass, HasSeverity, PreviewError, PreviewResult};

pub use crate::capture::{FrameSource, RawFrame, SyntheticFrameSource};
pub use crate::config::PreviewConfig;
pub use crate::core::diagnostics::{PipelineEvent, StatsSnapshot};
pub use crate::core::output_image::OutputImage;
pub use crate::display::{DisplaySink, DisplayWorker};
pub use crate::pipeline::{FrameOutcome, PipelineState, PreviewPipeline, PreviewPipelineBuilder};

/// Options for a synthetic preview run.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Width of the generated camera frames.
    pub width: u32,

    /// Height of the generated camera frames.
    pub height: u32,

    /// Number of frames the synthetic camera produces.
    pub frames: u64,

    /// Frame rate of the synthetic camera. Must be greater than 0.
    pub fps: u32,

    /// Threads delivering frame-available notifications concurrently.
    ///
    /// More than one exercises the single-flight gate: notifications that
    /// arrive while a frame is in flight are dropped.
    pub delivery_threads: usize,

    /// Write the last rendered image to this path (PNG, JPEG, ... by extension).
    pub save_latest: Option<String>,

    /// Pipeline configuration.
    pub config: PreviewConfig,
}

/// Display sink that only counts what it is shown.
#[derive(Debug, Default)]
pub struct CountingSink {
    rendered: AtomicU64,
}

impl CountingSink {
    pub fn rendered(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }
}

impl DisplaySink for CountingSink {
    fn render_image(&self, image: Arc<OutputImage>) -> PreviewResult<()> {
        trace!(
            sequence = image.sequence(),
            width = image.width(),
            height = image.height(),
            "image rendered"
        );
        self.rendered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Drive a pipeline from a synthetic camera and return the final counters.
///
/// Frames are delivered from blocking threads at the requested rate; the
/// display worker runs on the current Tokio runtime.
pub async fn run_preview(options: PreviewOptions) -> Result<StatsSnapshot> {
    if options.fps == 0 {
        return Err(anyhow!("fps must be greater than 0"));
    }
    if options.width == 0 || options.height == 0 {
        return Err(anyhow!(
            "frame size must be non-zero (got {}x{})",
            options.width,
            options.height
        ));
    }

    let sink = Arc::new(CountingSink::default());
    let (pipeline, worker) = PreviewPipeline::builder()
        .with_config(options.config.clone())
        .with_sink(&sink)
        .build()?;
    let pipeline = Arc::new(pipeline);
    let source = Arc::new(SyntheticFrameSource::new(options.width, options.height));

    info!(
        width = options.width,
        height = options.height,
        frames = options.frames,
        fps = options.fps,
        "starting synthetic camera"
    );

    let interval = Duration::from_secs_f64(1.0 / options.fps as f64);
    let threads = options.delivery_threads.max(1);
    let mut deliveries = Vec::with_capacity(threads);
    for index in 0..threads {
        let pipeline = pipeline.clone();
        let source = source.clone();
        let frames = options.frames;
        deliveries.push(tokio::task::spawn_blocking(move || {
            for _ in 0..frames {
                // One producer; every thread still gets a notification per frame.
                if index == 0 {
                    source.push_frames(1);
                }
                pipeline.on_frame(source.as_ref());
                std::thread::sleep(interval);
            }
        }));
    }
    for delivery in deliveries {
        delivery.await.context("frame delivery thread failed")?;
    }

    pipeline.flush_display().await?;
    let stats = pipeline.stats();

    if let Some(path) = &options.save_latest {
        let latest = pipeline
            .latest_image()
            .ok_or_else(|| anyhow!("no preview image was rendered"))?;
        latest
            .as_rgba()
            .save(path)
            .with_context(|| format!("failed to save latest image to {}", path))?;
        info!(path = %path, sequence = latest.sequence(), "saved latest image");
    }

    pipeline.clear_latest_image();
    drop(pipeline);
    worker.join().await?;

    let tracker = source.tracker();
    if !tracker.balanced() {
        return Err(anyhow!(
            "frame release imbalance: acquired {}, released {}, leaked {}, double released {}",
            tracker.acquired(),
            tracker.released(),
            tracker.leaked(),
            tracker.double_released()
        ));
    }
    info!(rendered = sink.rendered(), "synthetic camera finished");
    Ok(stats)
}

//! # Display Dispatcher
//!
//! Hands finished preview images to the display sink on the display context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  try_send   ┌──────────────┐  recv   ┌──────────────────┐
//! │ frame delivery   │────────────▶│ bounded mpsc │────────▶│ display worker   │
//! │ (on_frame)       │  never      │ FIFO channel │         │ render_image()   │
//! └──────────────────┘  blocks     └──────────────┘         │ latest.replace() │
//!                                                           └──────────────────┘
//! ```
//!
//! Submission order on the channel is the order in which the worker renders.
//! Preview mode is checked at submission and again right before rendering, so
//! turning preview off stops updates that are already queued. Whatever the
//! reason an image is not rendered, it is dropped with a diagnostic event and
//! the pipeline carries on.

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::diagnostics::PipelineEvent;
use crate::core::output_image::OutputImage;
use crate::error::{PreviewError, PreviewResult};
use crate::pipeline::Shared;

/// Receiver of rendered preview images, e.g. an image view.
///
/// Called on the display worker only. Returning an error means the target
/// cannot show the image (view detached, surface lost); the image is dropped.
pub trait DisplaySink: Send + Sync + 'static {
    fn render_image(&self, image: Arc<OutputImage>) -> PreviewResult<()>;
}

enum DisplayCommand {
    Render(Arc<OutputImage>),
    Flush(oneshot::Sender<()>),
}

/// Sending half, owned by the pipeline.
pub struct DisplayDispatcher {
    tx: mpsc::Sender<DisplayCommand>,
    shared: Arc<Shared>,
}

/// Handle to the display worker task.
///
/// The worker stops once the owning pipeline (and with it the dispatcher) is dropped.
pub struct DisplayWorker {
    handle: JoinHandle<()>,
}

impl DisplayWorker {
    /// Wait for the worker to drain its queue and exit.
    pub async fn join(self) -> PreviewResult<()> {
        self.handle.await.map_err(|e| PreviewError::external("tokio", e))
    }

    /// Stop the worker without draining.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl DisplayDispatcher {
    /// Start the display worker on `runtime` and return both halves.
    pub(crate) fn spawn(
        sink: Option<Weak<dyn DisplaySink>>,
        shared: Arc<Shared>,
        queue_depth: usize,
        runtime: &Handle,
    ) -> (Self, DisplayWorker) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let handle = runtime.spawn(run_display_worker(rx, sink, shared.clone()));
        (Self { tx, shared }, DisplayWorker { handle })
    }

    /// Queue `image` for the display context without blocking.
    ///
    /// Returns `true` if the image was queued. Dropped images are reported
    /// through the pipeline diagnostics.
    pub fn dispatch(&self, image: Arc<OutputImage>) -> bool {
        let stats = &self.shared.stats;
        if !self.shared.preview_mode() {
            stats.record(PipelineEvent::DroppedNotPreviewing);
            return false;
        }

        match self.tx.try_send(DisplayCommand::Render(image)) {
            Ok(()) => {
                stats.image_dispatched();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("display queue full");
                stats.record(PipelineEvent::DroppedSinkUnavailable);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("display worker stopped");
                stats.record(PipelineEvent::DroppedSinkUnavailable);
                false
            }
        }
    }

    /// Resolve once everything queued before this call has been handled.
    pub async fn flush(&self) -> PreviewResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(DisplayCommand::Flush(ack_tx))
            .await
            .map_err(|_| display_stopped("flush"))?;
        ack_rx.await.map_err(|_| display_stopped("flush"))
    }
}

fn display_stopped(operation: &str) -> PreviewError {
    PreviewError::state("display worker stopped", operation, "display channel closed")
}

async fn run_display_worker(
    mut rx: mpsc::Receiver<DisplayCommand>,
    sink: Option<Weak<dyn DisplaySink>>,
    shared: Arc<Shared>,
) {
    debug!("display worker started");
    while let Some(command) = rx.recv().await {
        match command {
            DisplayCommand::Render(image) => deliver(sink.as_ref(), &shared, image),
            DisplayCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("display worker exiting");
}

fn deliver(sink: Option<&Weak<dyn DisplaySink>>, shared: &Shared, image: Arc<OutputImage>) {
    if !shared.preview_mode() {
        shared.stats.record(PipelineEvent::DroppedNotPreviewing);
        return;
    }

    let Some(sink) = sink.and_then(Weak::upgrade) else {
        debug!(sequence = image.sequence(), "no display sink attached");
        shared.stats.record(PipelineEvent::DroppedSinkUnavailable);
        return;
    };

    match sink.render_image(image.clone()) {
        Ok(()) => {
            shared.latest.replace(image);
            shared.stats.image_rendered();
        }
        Err(error) => {
            debug!(sequence = image.sequence(), %error, "display sink refused image");
            shared.stats.record(PipelineEvent::DroppedSinkUnavailable);
        }
    }
}

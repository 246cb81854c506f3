//! # Pipeline Diagnostics
//!
//! Named diagnostic events and lock-free counters for the preview pipeline.
//!
//! Every drop or failure is reported twice: as a `tracing` event carrying the
//! event's stable name, and as an increment of the matching counter in
//! [`PipelineStats`]. Counters can be read at any time through
//! [`PipelineStats::snapshot`] without disturbing the frame-delivery context.
//!
//! | Event | Name | Level | Class |
//! |-------|------|-------|-------|
//! | `NoFrameAvailable` | `no frame available` | debug | no-data |
//! | `DroppedNotPreviewing` | `dropped: not in preview mode` | debug | policy drop |
//! | `DroppedBusy` | `dropped: pipeline busy` | debug | policy drop |
//! | `DroppedSinkUnavailable` | `dropped: sink unavailable` | debug | sink unavailable |
//! | `ProcessingFailure` | `processing failure` | warn | processing failure |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{ErrorClass, PreviewError};

/// Diagnostic event emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineEvent {
    NoFrameAvailable,
    DroppedNotPreviewing,
    DroppedBusy,
    DroppedSinkUnavailable,
    ProcessingFailure,
}

impl PipelineEvent {
    /// Stable event name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFrameAvailable => "no frame available",
            Self::DroppedNotPreviewing => "dropped: not in preview mode",
            Self::DroppedBusy => "dropped: pipeline busy",
            Self::DroppedSinkUnavailable => "dropped: sink unavailable",
            Self::ProcessingFailure => "processing failure",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoFrameAvailable => ErrorClass::NoData,
            Self::DroppedNotPreviewing | Self::DroppedBusy => ErrorClass::PolicyDrop,
            Self::DroppedSinkUnavailable => ErrorClass::SinkUnavailable,
            Self::ProcessingFailure => ErrorClass::ProcessingFailure,
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub no_frame: u64,
    pub dropped_not_previewing: u64,
    pub dropped_busy: u64,
    pub dropped_sink_unavailable: u64,
    pub processing_failures: u64,
    pub frames_admitted: u64,
    pub frames_processed: u64,
    pub images_dispatched: u64,
    pub images_rendered: u64,
    pub scratch_reallocations: u64,
}

impl StatsSnapshot {
    /// Count for a single diagnostic event.
    pub fn event_count(&self, event: PipelineEvent) -> u64 {
        match event {
            PipelineEvent::NoFrameAvailable => self.no_frame,
            PipelineEvent::DroppedNotPreviewing => self.dropped_not_previewing,
            PipelineEvent::DroppedBusy => self.dropped_busy,
            PipelineEvent::DroppedSinkUnavailable => self.dropped_sink_unavailable,
            PipelineEvent::ProcessingFailure => self.processing_failures,
        }
    }

    /// Frames that reached the pipeline but were discarded before or during processing.
    pub fn frames_dropped(&self) -> u64 {
        self.dropped_not_previewing + self.dropped_busy + self.processing_failures
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Preview pipeline stats:")?;
        writeln!(f, "  Frames admitted:            {}", self.frames_admitted)?;
        writeln!(f, "  Frames processed:           {}", self.frames_processed)?;
        writeln!(f, "  Images dispatched:          {}", self.images_dispatched)?;
        writeln!(f, "  Images rendered:            {}", self.images_rendered)?;
        writeln!(f, "  Dropped (busy):             {}", self.dropped_busy)?;
        writeln!(f, "  Dropped (not previewing):   {}", self.dropped_not_previewing)?;
        writeln!(f, "  Dropped (sink unavailable): {}", self.dropped_sink_unavailable)?;
        writeln!(f, "  Processing failures:        {}", self.processing_failures)?;
        writeln!(f, "  No frame available:         {}", self.no_frame)?;
        write!(f, "  Scratch reallocations:      {}", self.scratch_reallocations)
    }
}

/// Lock-free counters shared by the frame-delivery and display contexts.
#[derive(Debug, Default)]
pub struct PipelineStats {
    no_frame: AtomicU64,
    dropped_not_previewing: AtomicU64,
    dropped_busy: AtomicU64,
    dropped_sink_unavailable: AtomicU64,
    processing_failures: AtomicU64,
    frames_admitted: AtomicU64,
    frames_processed: AtomicU64,
    images_dispatched: AtomicU64,
    images_rendered: AtomicU64,
    scratch_reallocations: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `event` and bump its counter.
    pub fn record(&self, event: PipelineEvent) {
        let name = event.as_str();
        match event {
            PipelineEvent::NoFrameAvailable => {
                debug!(event = name, "preview frame event");
                self.no_frame.fetch_add(1, Ordering::Relaxed);
            }
            PipelineEvent::DroppedNotPreviewing => {
                debug!(event = name, "preview frame event");
                self.dropped_not_previewing.fetch_add(1, Ordering::Relaxed);
            }
            PipelineEvent::DroppedBusy => {
                debug!(event = name, "preview frame event");
                self.dropped_busy.fetch_add(1, Ordering::Relaxed);
            }
            PipelineEvent::DroppedSinkUnavailable => {
                debug!(event = name, "preview frame event");
                self.dropped_sink_unavailable.fetch_add(1, Ordering::Relaxed);
            }
            PipelineEvent::ProcessingFailure => {
                warn!(event = name, "preview frame event");
                self.processing_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Log a processing failure together with its cause.
    pub fn record_failure(&self, error: &PreviewError) {
        warn!(
            event = PipelineEvent::ProcessingFailure.as_str(),
            category = error.category(),
            operation = error.context().operation.as_deref().unwrap_or("unknown"),
            %error,
            "preview frame event"
        );
        self.processing_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_admitted(&self) {
        self.frames_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_processed(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn image_dispatched(&self) {
        self.images_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn image_rendered(&self) {
        self.images_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn scratch_reallocated(&self) {
        self.scratch_reallocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            no_frame: self.no_frame.load(Ordering::Relaxed),
            dropped_not_previewing: self.dropped_not_previewing.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dropped_sink_unavailable: self.dropped_sink_unavailable.load(Ordering::Relaxed),
            processing_failures: self.processing_failures.load(Ordering::Relaxed),
            frames_admitted: self.frames_admitted.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            images_dispatched: self.images_dispatched.load(Ordering::Relaxed),
            images_rendered: self.images_rendered.load(Ordering::Relaxed),
            scratch_reallocations: self.scratch_reallocations.load(Ordering::Relaxed),
        }
    }
}

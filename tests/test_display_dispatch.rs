//! Integration tests for the display handoff
//!
//! These tests verify submission-order rendering, the preview mode checks at
//! dispatch and at delivery, and that unavailable sinks drop updates without
//! touching the latest image.

mod common;

use std::sync::Arc;
use std::thread;

use photobooth_preview::{FrameOutcome, PreviewConfig, PreviewPipeline, SyntheticFrameSource};

use common::mock_kernels::BlockingDecoder;
use common::mock_sinks::{DetachedSink, GatedSink, RecordingSink};

fn config(depth: usize) -> PreviewConfig {
    PreviewConfig::new(0, 16, depth)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_images_render_in_submission_order() {
    let sink = RecordingSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(8))
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    for _ in 0..5 {
        source.push_frames(1);
        pipeline.on_frame(&source);
    }
    pipeline.flush_display().await.unwrap();

    assert_eq!(sink.sequences(), vec![0, 1, 2, 3, 4]);
    assert!(sink.sizes().iter().all(|&size| size == (16, 16)));
    assert_eq!(pipeline.latest_image().unwrap().sequence(), 4);
    assert_eq!(pipeline.stats().images_rendered, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mode_switched_off_mid_flight_drops_dispatch() {
    let decoder = BlockingDecoder::blocking_on(1);
    let (entered, release) = (decoder.entered.clone(), decoder.release.clone());
    let sink = RecordingSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_decoder(decoder)
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    pipeline.on_frame(&source);
    pipeline.flush_display().await.unwrap();
    let before = pipeline.latest_image().unwrap();
    assert_eq!(before.sequence(), 0);

    let outcome = thread::scope(|scope| {
        source.push_frames(1);
        let in_flight = scope.spawn(|| pipeline.on_frame(&source));
        entered.wait();
        pipeline.set_preview_mode(false);
        release.open();
        in_flight.join().unwrap()
    });

    // Processing completes, the dispatch does not
    assert_eq!(
        outcome,
        FrameOutcome::Processed {
            sequence: 1,
            dispatched: false
        }
    );
    pipeline.flush_display().await.unwrap();
    assert!(Arc::ptr_eq(&pipeline.latest_image().unwrap(), &before));
    assert_eq!(sink.sequences(), vec![0]);

    let stats = pipeline.stats();
    assert_eq!(stats.dropped_not_previewing, 1);
    assert_eq!(stats.frames_processed, 2);
    assert!(!pipeline.is_busy());
    assert!(source.tracker().balanced());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_update_is_dropped_when_mode_switches_off() {
    let sink = GatedSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    pipeline.on_frame(&source);
    sink.entered.wait();

    // Accepted while previewing, but still queued behind the first render
    source.push_frames(1);
    assert_eq!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed {
            sequence: 1,
            dispatched: true
        }
    );
    pipeline.set_preview_mode(false);
    sink.release.open();
    pipeline.flush_display().await.unwrap();

    assert_eq!(sink.inner.sequences(), vec![0]);
    assert_eq!(pipeline.latest_image().unwrap().sequence(), 0);
    assert_eq!(pipeline.stats().dropped_not_previewing, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_display_queue_drops_without_blocking() {
    let sink = GatedSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(1))
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    pipeline.on_frame(&source);
    sink.entered.wait();

    source.push_frames(1);
    assert!(matches!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed { dispatched: true, .. }
    ));
    source.push_frames(1);
    assert!(matches!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed { dispatched: false, .. }
    ));

    sink.release.open();
    pipeline.flush_display().await.unwrap();
    assert_eq!(sink.inner.sequences(), vec![0, 1]);
    assert_eq!(pipeline.stats().dropped_sink_unavailable, 1);
}

#[tokio::test]
async fn test_torn_down_sink_drops_updates() {
    let sink = RecordingSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_sink(&sink)
        .build()
        .unwrap();
    drop(sink);
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    assert!(matches!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed { dispatched: true, .. }
    ));
    pipeline.flush_display().await.unwrap();

    assert!(pipeline.latest_image().is_none());
    let stats = pipeline.stats();
    assert_eq!(stats.dropped_sink_unavailable, 1);
    assert_eq!(stats.images_rendered, 0);
}

#[tokio::test]
async fn test_refusing_sink_drops_updates() {
    let sink = Arc::new(DetachedSink);
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    for _ in 0..2 {
        source.push_frames(1);
        pipeline.on_frame(&source);
    }
    pipeline.flush_display().await.unwrap();

    assert!(pipeline.latest_image().is_none());
    assert_eq!(pipeline.stats().dropped_sink_unavailable, 2);
}

#[tokio::test]
async fn test_pipeline_without_sink_still_processes() {
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    assert!(matches!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed { .. }
    ));
    pipeline.flush_display().await.unwrap();
    assert!(pipeline.latest_image().is_none());
    assert_eq!(pipeline.stats().dropped_sink_unavailable, 1);
}

#[tokio::test]
async fn test_latest_image_releases_previous() {
    let sink = RecordingSink::new();
    let (pipeline, _worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_sink(&sink)
        .build()
        .unwrap();
    let source = SyntheticFrameSource::new(32, 24);

    source.push_frames(1);
    pipeline.on_frame(&source);
    pipeline.flush_display().await.unwrap();
    let first = Arc::downgrade(&pipeline.latest_image().unwrap());
    assert!(first.upgrade().is_some());

    source.push_frames(1);
    pipeline.on_frame(&source);
    pipeline.flush_display().await.unwrap();
    assert!(first.upgrade().is_none());

    let second = Arc::downgrade(&pipeline.latest_image().unwrap());
    pipeline.clear_latest_image();
    assert!(pipeline.latest_image().is_none());
    assert!(second.upgrade().is_none());
}

#[tokio::test]
async fn test_worker_exits_when_pipeline_is_dropped() {
    let (pipeline, worker) = PreviewPipeline::builder().build().unwrap();
    drop(pipeline);
    worker.join().await.unwrap();
}

#[tokio::test]
async fn test_aborted_worker_stops_accepting_updates() {
    let sink = RecordingSink::new();
    let (pipeline, worker) = PreviewPipeline::builder()
        .with_config(config(4))
        .with_sink(&sink)
        .build()
        .unwrap();
    assert!(!worker.is_finished());

    worker.abort();
    assert!(pipeline.flush_display().await.is_err());
    for _ in 0..100 {
        if worker.is_finished() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(worker.is_finished());

    let source = SyntheticFrameSource::new(32, 24);
    source.push_frames(1);
    assert!(matches!(
        pipeline.on_frame(&source),
        FrameOutcome::Processed { dispatched: false, .. }
    ));
    assert_eq!(pipeline.stats().dropped_sink_unavailable, 1);
    assert_eq!(sink.count(), 0);
    assert!(source.tracker().balanced());

    // Cancelled, not drained
    assert!(worker.join().await.is_err());
}

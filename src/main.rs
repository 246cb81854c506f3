use anyhow::Result;
use clap::Parser;
use photobooth_preview::{PreviewConfig, PreviewOptions};
use tracing_subscriber::EnvFilter;

/// Camera preview pipeline driven by a synthetic camera:
/// - single-flight processing of YUV 4:2:0 frames
/// - centered square crop, rescale and rotation by sensor orientation
/// - non-blocking handoff to a display worker
#[derive(Parser, Debug)]
#[command(name = "preview")]
#[command(about = "📷 Run the camera preview pipeline against a synthetic camera")]
#[command(long_about = "Run the camera preview pipeline against a synthetic camera.
Prints frame counters at the end and can save the last rendered preview image.")]
struct Args {
    /// Camera frame width
    #[arg(long, default_value_t = 640, help = "Width of the synthetic camera frames")]
    width: u32,

    /// Camera frame height
    #[arg(long, default_value_t = 480, help = "Height of the synthetic camera frames")]
    height: u32,

    /// Sensor orientation in degrees
    #[arg(short, long, help = "Clockwise sensor orientation: 0, 90, 180 or 270")]
    orientation: Option<u32>,

    /// Side of the square preview image
    #[arg(short = 's', long, help = "Side of the square output image in pixels")]
    output_size: Option<u32>,

    /// Number of frames
    #[arg(short = 'n', long, default_value_t = 120, help = "How many frames the camera produces")]
    frames: u64,

    /// Frames per second
    #[arg(short = 'f', long, default_value_t = 30, help = "Synthetic camera frame rate")]
    fps: u32,

    /// Concurrent frame-delivery threads
    #[arg(long, default_value_t = 1, help = "Threads delivering frame notifications (>1 shows busy drops)")]
    delivery_threads: usize,

    /// JSON configuration file
    #[arg(short, long, help = "JSON file with sensor_orientation, output_size, display_queue_depth")]
    config: Option<String>,

    /// Save the last rendered image
    #[arg(long, help = "Write the last rendered preview image to this path")]
    save_latest: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PreviewConfig::from_json_file(path)?,
        None => PreviewConfig::default(),
    };
    if let Some(orientation) = args.orientation {
        config.sensor_orientation = orientation;
    }
    if let Some(size) = args.output_size {
        config.output_size = size;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let options = PreviewOptions {
        width: args.width,
        height: args.height,
        frames: args.frames,
        fps: args.fps,
        delivery_threads: args.delivery_threads,
        save_latest: args.save_latest,
        config,
    };

    let stats = photobooth_preview::run_preview(options).await?;
    println!("{}", stats);
    Ok(())
}

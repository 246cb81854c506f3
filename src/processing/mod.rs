//! # Processing Module
//!
//! Decode and crop/rescale contracts for the preview pipeline, plus the
//! default CPU implementations.

pub mod decoder;
pub mod processing;
pub mod rescaler;

// Re-export commonly used types for convenience
pub use decoder::Yuv420Decoder;
pub use processing::{CropRescaler, FrameDecoder};
pub use rescaler::SquareCropRescaler;
pub use preview_scale::rotate::Rotation;

//! # Core Infrastructure Module
//!
//! Building blocks shared by the frame-delivery and display contexts: scratch
//! buffers, the output image type, the latest-frame holder and diagnostics.

pub mod diagnostics;
pub mod latest_frame;
pub mod output_image;
pub mod scratch;

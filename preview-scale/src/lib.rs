// SPDX-License-Identifier: MIT
//! # preview-scale: CPU Kernels for Camera Preview Frames
//!
//! This crate holds the pixel-level kernels used by the preview pipeline. The
//! pipeline itself only relies on their contracts; everything that touches
//! individual pixels lives here.
//!
//! ## Key Components
//!
//! - [`yuv`]: YUV 4:2:0 (three planes, arbitrary row/pixel strides) to BGRA8 conversion
//! - [`plan`]: centered square crop planning
//! - [`rotate`]: sensor rotation in quarter turns for square BGRA8 images
//! - [`cpu`]: crop + SIMD rescale + rotate, built on `fast_image_resize`
//!
//! ## Pixel Layout
//!
//! Intermediate pixels are BGRA8 stored as `[u8; 4]`, which is the layout
//! `fast_image_resize` handles as `U8x4`. Alpha is always opaque.
//!
//! ## Usage Example
//!
//! ```rust
//! use preview_scale::cpu::{crop_and_rescale_bgra, Staging};
//! use preview_scale::plan::{build_square_plan, Size};
//! use preview_scale::rotate::Rotation;
//!
//! let input = Size { w: 64, h: 48 };
//! let src = vec![0u8; (input.w * input.h * 4) as usize];
//! let plan = build_square_plan(input, 32);
//!
//! let mut resizer = fast_image_resize::Resizer::new();
//! let mut staging = Staging::with_capacity(32 * 32 * 4);
//! let mut dst = vec![0u8; 32 * 32 * 4];
//!
//! crop_and_rescale_bgra(&mut resizer, &src, &plan, Rotation::Deg90, &mut staging, &mut dst)
//!     .expect("scaling succeeds");
//! ```

pub mod cpu;
pub mod plan;
pub mod rotate;
pub mod yuv;

pub use cpu::ScaleError;

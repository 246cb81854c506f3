//! # Configuration Module
//!
//! This module provides the configuration structure for the preview pipeline.

pub mod config;

pub use config::PreviewConfig;

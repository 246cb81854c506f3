//! # Configuration Module
//!
//! This module provides the configuration structure and validation for the
//! preview pipeline. It is the common interface between the CLI demo, embedding
//! applications, and the core pipeline.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `sensor_orientation` | `u32` | 0/90/180/270 | Clockwise rotation applied to each preview image |
//! | `output_size` | `u32` | 1-4096 | Side of the square output image |
//! | `display_queue_depth` | `usize` | ≥ 1 | Images that may wait for the display context |
//!
//! ## Examples
//!
//! ```rust
//! use photobooth_preview::config::config::PreviewConfig;
//!
//! // Use defaults
//! let config = PreviewConfig::default();
//! assert_eq!(config.output_size, 480);
//!
//! // Sensor mounted a quarter turn off
//! let config = PreviewConfig::new(90, 480, 16);
//! assert!(config.validate().is_ok());
//!
//! // Loaded from JSON, missing fields fall back to defaults
//! let config = PreviewConfig::from_json_str(r#"{ "sensor_orientation": 270 }"#).unwrap();
//! assert_eq!(config.output_size, 480);
//! ```

use std::path::Path;

use preview_scale::rotate::Rotation;
use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, PreviewResult};

/// Largest square side the pipeline will produce.
pub const MAX_OUTPUT_SIZE: u32 = 4096;

/// Configuration structure for the preview pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Clockwise sensor orientation in degrees.
    ///
    /// Camera sensors are frequently mounted rotated relative to the display.
    /// Each output image is rotated by this amount after cropping.
    pub sensor_orientation: u32,

    /// Side length of the square output image in pixels.
    pub output_size: u32,

    /// Capacity of the channel between the frame-delivery and display contexts.
    ///
    /// When the display context falls this far behind, new images are dropped
    /// instead of blocking frame delivery.
    pub display_queue_depth: usize,
}

impl Default for PreviewConfig {
    /// Default values:
    /// - `sensor_orientation`: 0 (sensor aligned with display)
    /// - `output_size`: 480
    /// - `display_queue_depth`: 16
    fn default() -> Self {
        Self {
            sensor_orientation: 0,
            output_size: 480,
            display_queue_depth: 16,
        }
    }
}

impl PreviewConfig {
    /// Creates a new configuration with the specified parameters.
    pub fn new(sensor_orientation: u32, output_size: u32, display_queue_depth: usize) -> Self {
        Self {
            sensor_orientation,
            output_size,
            display_queue_depth,
        }
    }

    /// Set the sensor orientation as reported by the camera characteristics.
    ///
    /// Some camera stacks do not report an orientation at all; that is treated as 0.
    pub fn with_sensor_orientation(mut self, degrees: Option<u32>) -> Self {
        self.sensor_orientation = degrees.unwrap_or(0);
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if Rotation::from_degrees(self.sensor_orientation).is_none() {
            return Err(format!(
                "Sensor orientation must be one of 0, 90, 180, 270 (got {})",
                self.sensor_orientation
            ));
        }
        if self.output_size == 0 || self.output_size > MAX_OUTPUT_SIZE {
            return Err(format!(
                "Output size must be between 1 and {}",
                MAX_OUTPUT_SIZE
            ));
        }
        if self.display_queue_depth == 0 {
            return Err("Display queue depth must be at least 1".to_string());
        }
        Ok(())
    }

    /// Validate and convert into a typed error for library callers.
    pub fn validated(self) -> PreviewResult<Self> {
        match self.validate() {
            Ok(()) => Ok(self),
            Err(reason) => Err(PreviewError::config(
                "preview_config",
                format!("{:?}", self),
                reason,
            )),
        }
    }

    /// Rotation to apply to each output image.
    ///
    /// Invalid orientations fall back to no rotation; `validate` reports them.
    pub fn rotation(&self) -> Rotation {
        Rotation::from_degrees(self.sensor_orientation).unwrap_or_default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> PreviewResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PreviewResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PreviewError::io("read preview config", e).with_path(path.display().to_string())
        })?;
        Self::from_json_str(&text)
    }
}

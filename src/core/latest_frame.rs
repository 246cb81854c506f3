//! # Latest-Frame Holder
//!
//! Keeps the most recently rendered preview image for downstream consumers such
//! as an inference stage. At most one image is held; replacing or clearing it
//! gives up the holder's reference, and the image memory is returned as soon as
//! no consumer still holds a clone.
//!
//! ```rust
//! use std::sync::Arc;
//! use photobooth_preview::core::latest_frame::LatestFrame;
//! use photobooth_preview::core::output_image::OutputImage;
//!
//! let holder = LatestFrame::new();
//! assert!(holder.get().is_none());
//!
//! holder.replace(Arc::new(OutputImage::new(image::RgbaImage::new(4, 4), 1)));
//! assert_eq!(holder.get().map(|img| img.sequence()), Some(1));
//!
//! holder.clear();
//! assert!(holder.get().is_none());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::output_image::OutputImage;

/// Slot for the most recent output image.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Arc<OutputImage>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<OutputImage>>> {
        // An image slot cannot be left half-written, so a poisoned lock is still usable
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `image` and release the previously held one.
    ///
    /// The previous image is dropped right after the new one is visible, outside
    /// the lock, so readers never observe an empty slot during a swap.
    pub fn replace(&self, image: Arc<OutputImage>) {
        let previous = self.slot().replace(image);
        drop(previous);
    }

    /// Current image, if one has been produced since creation or the last clear.
    pub fn get(&self) -> Option<Arc<OutputImage>> {
        self.slot().clone()
    }

    /// Release the held image and reset to empty.
    pub fn clear(&self) {
        let previous = self.slot().take();
        drop(previous);
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }
}

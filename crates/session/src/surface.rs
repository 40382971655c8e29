//! Display-side collaborators: the viewport that reports displayed bounds
//! and the surface that shows the preview.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reframe_crop_core::sampler::PreviewBitmap;
use reframe_crop_model::geometry::Bounds;

/// Reports the displayed size of the video element.
pub trait ViewportProvider: Send {
    fn displayed_bounds(&self) -> Bounds;
}

/// Receives every freshly rendered preview.
pub trait PreviewSink: Send {
    fn present(&mut self, bitmap: &PreviewBitmap);
}

/// A viewport whose size can be changed from another owner (e.g. a window
/// resize handler or a test).
#[derive(Debug, Clone)]
pub struct SharedViewport {
    bounds: Arc<Mutex<Bounds>>,
}

impl SharedViewport {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds: Arc::new(Mutex::new(bounds)),
        }
    }

    /// Simulate a layout change.
    pub fn resize(&self, bounds: Bounds) {
        match self.bounds.lock() {
            Ok(mut guard) => *guard = bounds,
            Err(poisoned) => *poisoned.into_inner() = bounds,
        }
    }
}

impl ViewportProvider for SharedViewport {
    fn displayed_bounds(&self) -> Bounds {
        match self.bounds.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl ViewportProvider for Bounds {
    fn displayed_bounds(&self) -> Bounds {
        *self
    }
}

/// Keeps the latest presented preview where other owners can read it.
#[derive(Debug, Clone, Default)]
pub struct SharedPreview {
    slot: Arc<Mutex<Option<PreviewBitmap>>>,
    presented: Arc<AtomicU64>,
}

impl SharedPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest preview.
    pub fn latest(&self) -> Option<PreviewBitmap> {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// How many previews were presented.
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }
}

impl PreviewSink for SharedPreview {
    fn present(&mut self, bitmap: &PreviewBitmap) {
        match self.slot.lock() {
            Ok(mut guard) => *guard = Some(bitmap.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(bitmap.clone()),
        }
        self.presented.fetch_add(1, Ordering::Relaxed);
    }
}

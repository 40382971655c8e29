//! Crop box state and drag handling.

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_crop_model::geometry::{AspectRatio, Bounds, CropRect};

use crate::resolver::resolve;

/// Owns the current crop rectangle.
///
/// The rectangle's size only changes through re-resolution (ratio or
/// bounds change); drags translate it.
#[derive(Debug, Clone)]
pub struct CropBoxController {
    ratio: AspectRatio,
    bounds: Bounds,
    rect: CropRect,
}

impl CropBoxController {
    /// Create a controller and resolve its initial rectangle.
    pub fn new(ratio: AspectRatio, bounds: Bounds) -> Self {
        Self {
            ratio,
            bounds,
            rect: resolve(&ratio, &bounds),
        }
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Switch ratio. Always re-anchors to the bottom-left corner.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> CropRect {
        self.ratio = ratio;
        self.rect = resolve(&self.ratio, &self.bounds);
        tracing::debug!(%ratio, rect = ?self.rect, "Aspect ratio changed");
        self.rect
    }

    /// Parse and apply a `W:H` ratio.
    ///
    /// A malformed string leaves the current ratio and rectangle in place.
    pub fn set_aspect_ratio_str(&mut self, input: &str) -> ReframeResult<CropRect> {
        let ratio = input
            .parse::<AspectRatio>()
            .map_err(|e| ReframeError::invalid_aspect_ratio(input, e.to_string()))?;
        Ok(self.set_aspect_ratio(ratio))
    }

    /// The video viewport was resized.
    pub fn on_bounds_changed(&mut self, bounds: Bounds) -> CropRect {
        self.bounds = bounds;
        self.rect = resolve(&self.ratio, &self.bounds);
        tracing::debug!(?bounds, rect = ?self.rect, "Bounds changed");
        self.rect
    }

    /// Move the rectangle's top-left corner to a proposed absolute position.
    ///
    /// Each axis is clamped to `[0, bounds - size]`. When the rectangle is
    /// larger than the bounds on an axis, that axis collapses to 0.
    pub fn apply_drag(&mut self, proposed_left: f64, proposed_top: f64) -> CropRect {
        let max_left = self.bounds.width - self.rect.width;
        let max_top = self.bounds.height - self.rect.height;
        self.rect.left = proposed_left.min(max_left).max(0.0);
        self.rect.top = proposed_top.min(max_top).max(0.0);
        self.rect
    }
}

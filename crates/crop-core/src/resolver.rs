//! Aspect ratio resolution.
//!
//! The crop starts from the full displayed width, shrinks to fit the
//! displayed height, and sits on the bottom-left corner of the video.

use reframe_crop_model::geometry::{AspectRatio, Bounds, CropRect};

/// Derive the crop rectangle for `ratio` inside `bounds`.
///
/// Degenerate bounds produce [`CropRect::ZERO`], which callers treat as
/// "not ready".
pub fn resolve(ratio: &AspectRatio, bounds: &Bounds) -> CropRect {
    if bounds.is_degenerate() {
        return CropRect::ZERO;
    }

    let (w_ratio, h_ratio) = (ratio.width_ratio(), ratio.height_ratio());
    let natural_height = (bounds.width / w_ratio) * h_ratio;
    let height = natural_height.min(bounds.height);
    let width = height * w_ratio / h_ratio;

    CropRect {
        width,
        height,
        top: bounds.height - height,
        left: 0.0,
    }
}

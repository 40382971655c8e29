//! Crop geometry types.
//!
//! Coordinates are displayed pixels: `(0.0, 0.0)` is the top-left corner
//! of the video's displayed area, `(bounds.width, bounds.height)` its
//! bottom-right corner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing rectangle ratios and edges.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Reasons an aspect ratio string is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseAspectRatioError {
    #[error("missing ':' separator")]
    MissingSeparator,

    #[error("expected exactly two components")]
    TooManyComponents,

    #[error("component {component:?} is not a number")]
    NotANumber { component: String },

    #[error("component {value} must be a finite number greater than zero")]
    NotPositive { value: f64 },
}

/// A width:height ratio constraining the crop rectangle's shape.
///
/// Both components are finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    width_ratio: f64,
    height_ratio: f64,
}

impl AspectRatio {
    /// Portrait 9:16, the cropper's initial ratio.
    pub const PORTRAIT_9_16: AspectRatio = AspectRatio {
        width_ratio: 9.0,
        height_ratio: 16.0,
    };

    /// Build a ratio from its components.
    pub fn new(width_ratio: f64, height_ratio: f64) -> Result<Self, ParseAspectRatioError> {
        for value in [width_ratio, height_ratio] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParseAspectRatioError::NotPositive { value });
            }
        }
        Ok(Self {
            width_ratio,
            height_ratio,
        })
    }

    pub fn width_ratio(&self) -> f64 {
        self.width_ratio
    }

    pub fn height_ratio(&self) -> f64 {
        self.height_ratio
    }

    /// Width divided by height.
    pub fn value(&self) -> f64 {
        self.width_ratio / self.height_ratio
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT_9_16
    }
}

impl FromStr for AspectRatio {
    type Err = ParseAspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let width = parts.next().unwrap_or_default();
        let height = parts
            .next()
            .ok_or(ParseAspectRatioError::MissingSeparator)?;
        if parts.next().is_some() {
            return Err(ParseAspectRatioError::TooManyComponents);
        }

        let parse = |component: &str| {
            component
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseAspectRatioError::NotANumber {
                    component: component.trim().to_string(),
                })
        };

        Self::new(parse(width)?, parse(height)?)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = ParseAspectRatioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width_ratio, self.height_ratio)
    }
}

/// Size of the video's displayed area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either side is non-positive or not a number.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// The axis-aligned crop region, in displayed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

/// Rule-of-thirds guide positions drawn over the crop overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThirdsGuides {
    /// X positions of the two vertical guides.
    pub verticals: [f64; 2],
    /// Y positions of the two horizontal guides.
    pub horizontals: [f64; 2],
}

impl CropRect {
    /// Zero-area rectangle; means "not ready yet".
    pub const ZERO: CropRect = CropRect {
        width: 0.0,
        height: 0.0,
        top: 0.0,
        left: 0.0,
    };

    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            top,
            left,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Width divided by height, `None` for a zero height.
    pub fn ratio(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    /// Zero (or negative, or NaN) width or height.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// `[left, top, width, height]`, the keyframe export order.
    pub fn coordinates(&self) -> [f64; 4] {
        [self.left, self.top, self.width, self.height]
    }

    /// Check containment in `bounds` within [`GEOMETRY_EPSILON`].
    pub fn is_within(&self, bounds: &Bounds) -> bool {
        self.left >= -GEOMETRY_EPSILON
            && self.top >= -GEOMETRY_EPSILON
            && self.right() <= bounds.width + GEOMETRY_EPSILON
            && self.bottom() <= bounds.height + GEOMETRY_EPSILON
    }

    /// Check that the rectangle has the shape of `ratio`.
    pub fn matches_ratio(&self, ratio: &AspectRatio) -> bool {
        self.ratio()
            .map(|r| (r - ratio.value()).abs() <= GEOMETRY_EPSILON * ratio.value().max(1.0))
            .unwrap_or(false)
    }

    /// Same rectangle in another coordinate space (e.g. native pixels).
    pub fn scaled(&self, scale: DisplayScale) -> CropRect {
        let s = scale.factor();
        CropRect {
            width: self.width * s,
            height: self.height * s,
            top: self.top * s,
            left: self.left * s,
        }
    }

    /// Rule-of-thirds guides in displayed coordinates.
    pub fn thirds_guides(&self) -> ThirdsGuides {
        ThirdsGuides {
            verticals: [
                self.left + self.width / 3.0,
                self.left + self.width * 2.0 / 3.0,
            ],
            horizontals: [
                self.top + self.height / 3.0,
                self.top + self.height * 2.0 / 3.0,
            ],
        }
    }
}

/// Factor converting displayed pixels to the media's native pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale(f64);

impl DisplayScale {
    /// No scaling: the video is displayed at its native size.
    pub const IDENTITY: DisplayScale = DisplayScale(1.0);

    /// Build from an explicit factor; must be finite and positive.
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    /// `native_width / displayed_width`.
    ///
    /// Returns `None` when either width is zero, i.e. before metadata has
    /// loaded or while the element is collapsed.
    pub fn from_widths(native_width: u32, displayed_width: f64) -> Option<Self> {
        if native_width == 0 || !(displayed_width > 0.0) {
            return None;
        }
        Self::new(native_width as f64 / displayed_width)
    }

    pub fn factor(&self) -> f64 {
        self.0
    }
}

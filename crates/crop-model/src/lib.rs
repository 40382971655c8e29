//! Reframe Crop Model
//!
//! Defines the core data contracts of a cropping session:
//! - **Geometry:** Aspect ratios, displayed bounds, crop rectangles, and the
//!   display-to-source scale
//! - **Keyframes:** Playback snapshots and the append-only keyframe track
//!
//! All rectangle coordinates are in displayed (device-independent) pixels
//! relative to the top-left corner of the video's displayed area.

pub mod geometry;
pub mod keyframe;

pub use geometry::*;
pub use keyframe::*;

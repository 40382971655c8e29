//! Reframe Crop Core: the geometry and sampling engine
//!
//! Turns an aspect ratio, the video's displayed bounds, and a stream of
//! playback state into a live preview and a keyframe track:
//! - **Resolver:** Derive the bottom-left anchored crop rectangle
//! - **Controller:** Own the rectangle and clamp drags to the bounds
//! - **Sampler:** Crop and resize the current frame into the preview slot
//! - **Recorder:** Append keyframes on a wall-clock cadence while playing
//! - **Exporter:** Serialize the track and hand it to a sink
//!
//! This crate is pure computation with no async and no platform dependencies.
//! Time enters only as session-relative nanoseconds passed by the caller.

pub mod controller;
pub mod exporter;
pub mod recorder;
pub mod resolver;
pub mod sampler;

pub use controller::CropBoxController;
pub use exporter::{ExportSink, FileExportSink, MemoryExportSink, SessionExporter};
pub use recorder::KeyframeRecorder;
pub use resolver::resolve;
pub use sampler::{FrameSampler, FrameSource, PreviewBitmap, ReadyState};

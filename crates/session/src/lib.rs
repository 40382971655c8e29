//! Reframe Session
//!
//! Runs a cropper session against an external media playback service.
//! The session owns the crop rectangle and the keyframe track and polls
//! two cooperative timers: the 10 ms preview sampler and the 1 s keyframe
//! recorder.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   CropSession                    │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────┐ │
//! │  │ CropBox     │  │ FrameSampler │  │ Keyframe │ │
//! │  │ Controller  │─▶│  (10 ms)     │  │ Recorder │ │
//! │  └──────┬──────┘  └──────┬───────┘  │  (1 s)   │ │
//! │         │                │          └────┬─────┘ │
//! │         └────────────────┼───────────────┘       │
//! │                          ▼                       │
//! │        PreviewSink      KeyframeTrack ─▶ Export  │
//! └──────────────────────────────────────────────────┘
//!        ▲                        ▲
//!   ViewportProvider        MediaPlayback (events, frames)
//! ```

pub mod driver;
pub mod media;
pub mod session;
pub mod surface;

pub use driver::*;
pub use media::*;
pub use session::*;
pub use surface::*;

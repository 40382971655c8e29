//! Cropper session management.

use std::time::Duration;

use reframe_common::clock::{format_hms, IntervalTimer};
use reframe_common::config::{AppConfig, ExportSettings};
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_crop_core::controller::CropBoxController;
use reframe_crop_core::exporter::{ExportSink, SessionExporter};
use reframe_crop_core::recorder::KeyframeRecorder;
use reframe_crop_core::sampler::{FrameSampler, PreviewBitmap};
use reframe_crop_model::geometry::{AspectRatio, Bounds, CropRect, DisplayScale};
use reframe_crop_model::keyframe::{Keyframe, KeyframeTrack};

use crate::media::{check_playback_rate, check_volume, MediaPlayback, PlaybackEvent};
use crate::surface::{PreviewSink, ViewportProvider};

/// Configuration for a cropper session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ratio selected when the session is created.
    pub aspect_ratio: AspectRatio,

    /// Preview sampling cadence.
    pub preview_interval: Duration,

    /// Keyframe cadence (wall clock).
    pub keyframe_interval: Duration,

    /// Export settings.
    pub export: ExportSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::PORTRAIT_9_16,
            preview_interval: Duration::from_millis(10),
            keyframe_interval: Duration::from_secs(1),
            export: ExportSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Build from the application config.
    pub fn from_app_config(config: &AppConfig) -> ReframeResult<Self> {
        let ratio_str = &config.cropper.default_aspect_ratio;
        let aspect_ratio = ratio_str.parse::<AspectRatio>().map_err(|e| {
            ReframeError::config(format!("default_aspect_ratio {ratio_str:?}: {e}"))
        })?;
        Ok(Self {
            aspect_ratio,
            preview_interval: config.sampling.preview_interval(),
            keyframe_interval: config.sampling.keyframe_interval(),
            export: config.export.clone(),
        })
    }
}

/// State of a cropper session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, cropper not started yet.
    Idle,
    /// Cropper active: timers armed, events subscribed.
    Active,
    /// Cropper removed; the track stays readable until the next start.
    Stopped,
}

/// A typed user command.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Play,
    Pause,
    TogglePlayback,
    Seek(f64),
    SeekPercent(f64),
    SetVolume(f64),
    SetPlaybackRate(f64),
    SetAspectRatio(String),
    DragTo { left: f64, top: f64 },
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub preview_rendered: bool,
    pub keyframe: Option<Keyframe>,
    pub events_handled: usize,
}

/// Transport bar readout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportStatus {
    pub current_time: f64,
    pub duration: Option<f64>,
    pub is_playing: bool,
    pub volume: f64,
    pub playback_rate: f64,
}

impl TransportStatus {
    /// Position as a percentage of the duration.
    pub fn progress_percent(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.current_time / d * 100.0).clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    /// `HH:MM:SS | HH:MM:SS` as shown under the timeline.
    pub fn clock_label(&self) -> String {
        format!(
            "{} | {}",
            format_hms(self.current_time),
            format_hms(self.duration.unwrap_or(0.0))
        )
    }
}

/// Counters reported when a session stops.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSummary {
    pub keyframes: usize,
    pub previews_rendered: u64,
    pub previews_skipped: u64,
    pub keyframes_skipped: u64,
}

/// A cropper session over one media element.
///
/// Owns the crop rectangle and the keyframe track. All mutation happens
/// through `&mut self`, so the preview and keyframe loops never overlap.
pub struct CropSession {
    config: SessionConfig,
    state: SessionState,
    media: Box<dyn MediaPlayback>,
    viewport: Box<dyn ViewportProvider>,
    preview_sink: Option<Box<dyn PreviewSink>>,
    controller: CropBoxController,
    sampler: FrameSampler,
    recorder: KeyframeRecorder,
    exporter: SessionExporter,
    track: KeyframeTrack,
    preview_timer: Option<IntervalTimer>,
}

impl CropSession {
    /// Create an idle session.
    pub fn new(
        config: SessionConfig,
        media: Box<dyn MediaPlayback>,
        viewport: Box<dyn ViewportProvider>,
    ) -> Self {
        let controller = CropBoxController::new(config.aspect_ratio, viewport.displayed_bounds());
        let recorder = KeyframeRecorder::new(config.keyframe_interval);
        let exporter = SessionExporter::from_settings(&config.export);
        Self {
            config,
            state: SessionState::Idle,
            media,
            viewport,
            preview_sink: None,
            controller,
            sampler: FrameSampler::new(),
            recorder,
            exporter,
            track: KeyframeTrack::new(),
            preview_timer: None,
        }
    }

    /// Attach a surface that receives each new preview.
    pub fn with_preview_sink(mut self, sink: Box<dyn PreviewSink>) -> Self {
        self.preview_sink = Some(sink);
        self
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the cropper.
    ///
    /// Clears the previous track, re-resolves the rectangle against the
    /// current viewport, subscribes to playback events, and arms the
    /// preview timer. Keyframe recording starts right away if the media
    /// is already playing.
    pub fn start(&mut self, now_ns: u64) -> ReframeResult<()> {
        if self.state == SessionState::Active {
            return Err(ReframeError::session("Session already active"));
        }

        tracing::info!(
            backend = self.media.name(),
            ratio = %self.controller.aspect_ratio(),
            "Starting cropper session"
        );

        self.track.clear();
        self.sampler.reset();
        self.controller
            .on_bounds_changed(self.viewport.displayed_bounds());
        self.media.subscribe();
        self.preview_timer = Some(IntervalTimer::every(self.config.preview_interval, now_ns));
        if self.media.is_playing() {
            self.recorder.on_play(now_ns);
        }
        self.state = SessionState::Active;

        tracing::info!(rect = ?self.controller.rect(), "Cropper session started");
        Ok(())
    }

    /// Stop the cropper: cancel both timers and unsubscribe.
    pub fn stop(&mut self) -> ReframeResult<SessionSummary> {
        if self.state != SessionState::Active {
            return Err(ReframeError::session("Session not active"));
        }
        self.release();
        let summary = self.summary();
        tracing::info!(
            keyframes = summary.keyframes,
            previews = summary.previews_rendered,
            "Cropper session stopped"
        );
        Ok(summary)
    }

    /// Advance the session to `now_ns` (session-relative nanoseconds).
    ///
    /// The media service is refreshed even when the cropper is inactive;
    /// preview and keyframe work only happens while active.
    pub fn tick(&mut self, now_ns: u64) -> TickOutcome {
        self.media.refresh(now_ns);
        if self.state != SessionState::Active {
            return TickOutcome::default();
        }

        let mut outcome = TickOutcome::default();
        while let Some(event) = self.media.poll_event() {
            self.handle_event(event, now_ns);
            outcome.events_handled += 1;
        }

        let bounds = self.viewport.displayed_bounds();
        if bounds != self.controller.bounds() {
            let rect = self.controller.on_bounds_changed(bounds);
            tracing::info!(?bounds, ?rect, "Viewport resized, crop re-resolved");
        }

        let rect = self.controller.rect();

        let preview_due = self
            .preview_timer
            .as_mut()
            .map(|timer| timer.should_tick(now_ns))
            .unwrap_or(false);
        if preview_due {
            let scale = self.display_scale();
            if let Some(bitmap) = self.sampler.capture(&*self.media, &rect, scale) {
                outcome.preview_rendered = true;
                if let Some(sink) = self.preview_sink.as_mut() {
                    sink.present(bitmap);
                }
            }
        }

        let media = &self.media;
        outcome.keyframe = self
            .recorder
            .poll(now_ns, &rect, || media.snapshot(), &mut self.track);

        outcome
    }

    /// Apply a typed command.
    pub fn apply(&mut self, command: SessionCommand) -> ReframeResult<()> {
        match command {
            SessionCommand::Play => self.play(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::TogglePlayback => self.toggle_playback(),
            SessionCommand::Seek(secs) => self.seek(secs),
            SessionCommand::SeekPercent(percent) => self.seek_percent(percent),
            SessionCommand::SetVolume(volume) => self.set_volume(volume),
            SessionCommand::SetPlaybackRate(rate) => self.set_playback_rate(rate),
            SessionCommand::SetAspectRatio(ratio) => self.set_aspect_ratio(&ratio).map(|_| ()),
            SessionCommand::DragTo { left, top } => {
                self.drag_to(left, top);
                Ok(())
            }
        }
    }

    pub fn play(&mut self) -> ReframeResult<()> {
        self.media.play()
    }

    pub fn pause(&mut self) -> ReframeResult<()> {
        self.media.pause()
    }

    pub fn toggle_playback(&mut self) -> ReframeResult<()> {
        if self.media.is_playing() {
            self.media.pause()
        } else {
            self.media.play()
        }
    }

    /// Seek to an absolute media time in seconds.
    pub fn seek(&mut self, secs: f64) -> ReframeResult<()> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(reject(ReframeError::invalid_parameter(format!(
                "seek target must be a non-negative number, got {secs}"
            ))));
        }
        self.media.seek(secs)
    }

    /// Seek to a position on the timeline, `0..=100`.
    pub fn seek_percent(&mut self, percent: f64) -> ReframeResult<()> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(reject(ReframeError::invalid_parameter(format!(
                "timeline position must be within [0, 100], got {percent}"
            ))));
        }
        let duration = self
            .media
            .duration()
            .ok_or_else(|| reject(ReframeError::not_ready("duration unknown")))?;
        self.media.seek(percent / 100.0 * duration)
    }

    pub fn set_volume(&mut self, volume: f64) -> ReframeResult<()> {
        let volume = check_volume(volume).map_err(reject)?;
        self.media.set_volume(volume)
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> ReframeResult<()> {
        let rate = check_playback_rate(rate).map_err(reject)?;
        self.media.set_playback_rate(rate)
    }

    /// Switch aspect ratio from a `W:H` string.
    ///
    /// The rectangle re-anchors to the bottom-left corner; keyframe
    /// recording keeps its phase. A malformed ratio keeps the current one.
    pub fn set_aspect_ratio(&mut self, ratio: &str) -> ReframeResult<CropRect> {
        self.controller.set_aspect_ratio_str(ratio).map_err(reject)
    }

    /// Move the crop to an absolute proposed top-left position.
    pub fn drag_to(&mut self, left: f64, top: f64) -> CropRect {
        self.controller.apply_drag(left, top)
    }

    pub fn crop_rect(&self) -> CropRect {
        self.controller.rect()
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.controller.aspect_ratio()
    }

    pub fn bounds(&self) -> Bounds {
        self.controller.bounds()
    }

    pub fn track(&self) -> &KeyframeTrack {
        &self.track
    }

    /// The latest preview bitmap.
    pub fn preview(&self) -> Option<&PreviewBitmap> {
        self.sampler.latest()
    }

    /// Whether keyframes are currently being recorded.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn transport(&self) -> TransportStatus {
        TransportStatus {
            current_time: self.media.current_time(),
            duration: self.media.duration(),
            is_playing: self.media.is_playing(),
            volume: self.media.volume(),
            playback_rate: self.media.playback_rate(),
        }
    }

    /// Display-to-source scale for the current viewport.
    pub fn display_scale(&self) -> Option<DisplayScale> {
        let (native_width, _) = self.media.native_resolution()?;
        DisplayScale::from_widths(native_width, self.controller.bounds().width)
    }

    /// Serialize the track and hand it to `sink`.
    pub fn export_json(&self, sink: &mut dyn ExportSink) -> ReframeResult<usize> {
        self.exporter.download_json(&self.track, sink)
    }

    /// Counters for the current or last session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            keyframes: self.track.len(),
            previews_rendered: self.sampler.frames_rendered(),
            previews_skipped: self.sampler.frames_skipped(),
            keyframes_skipped: self.recorder.skipped(),
        }
    }

    // Internal helpers

    fn handle_event(&mut self, event: PlaybackEvent, now_ns: u64) {
        match event {
            PlaybackEvent::LoadedMetadata { duration } => {
                tracing::info!(
                    duration,
                    native = ?self.media.native_resolution(),
                    "Media metadata loaded"
                );
            }
            PlaybackEvent::TimeUpdate { current_time } => {
                tracing::trace!(current_time, "Time update");
            }
            PlaybackEvent::Play => self.recorder.on_play(now_ns),
            PlaybackEvent::Pause => self.recorder.on_pause(),
            PlaybackEvent::Ended => {
                tracing::info!(keyframes = self.track.len(), "Playback ended");
            }
        }
    }

    fn release(&mut self) {
        self.preview_timer = None;
        self.recorder.on_pause();
        self.media.unsubscribe();
        self.state = SessionState::Stopped;
    }
}

impl Drop for CropSession {
    fn drop(&mut self) {
        if self.state == SessionState::Active {
            tracing::debug!("Releasing timers of an active session on drop");
            self.release();
        }
    }
}

fn reject(err: ReframeError) -> ReframeError {
    tracing::warn!(error = %err, "Command rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedPlayer;

    fn session() -> CropSession {
        CropSession::new(
            SessionConfig::default(),
            Box::new(SimulatedPlayer::new(960, 540, 10.0)),
            Box::new(Bounds::new(640.0, 360.0)),
        )
    }

    #[test]
    fn test_new_session_is_idle_with_resolved_rect() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.crop_rect(), CropRect::new(0.0, 0.0, 202.5, 360.0));
        assert!(session.display_scale().is_none());
    }

    #[test]
    fn test_config_from_app_config() {
        let mut app = AppConfig::default();
        app.cropper.default_aspect_ratio = "4:5".to_string();
        app.sampling.keyframe_interval_ms = 500;
        let config = SessionConfig::from_app_config(&app).unwrap();
        assert_eq!(config.aspect_ratio.to_string(), "4:5");
        assert_eq!(config.keyframe_interval, Duration::from_millis(500));

        app.cropper.default_aspect_ratio = "wide".to_string();
        assert!(SessionConfig::from_app_config(&app).is_err());
    }

    #[test]
    fn test_transport_without_duration() {
        let status = TransportStatus {
            current_time: 5.0,
            duration: None,
            is_playing: false,
            volume: 1.0,
            playback_rate: 1.0,
        };
        assert_eq!(status.progress_percent(), 0.0);
        assert_eq!(status.clock_label(), "00:00:05 | 00:00:00");
    }

    #[test]
    fn test_toggle_playback_flips_media_state() {
        let mut session = session();
        session.apply(SessionCommand::TogglePlayback).unwrap();
        assert!(session.transport().is_playing);
        session.apply(SessionCommand::TogglePlayback).unwrap();
        assert!(!session.transport().is_playing);
    }

    #[test]
    fn test_seek_percent_needs_metadata() {
        let mut session = session();
        let err = session.seek_percent(50.0).unwrap_err();
        assert!(matches!(err, ReframeError::NotReady { .. }));

        session.tick(0);
        session.apply(SessionCommand::SeekPercent(25.0)).unwrap();
        assert_eq!(session.transport().current_time, 2.5);
    }

    #[test]
    fn test_tick_outcome_reports_keyframe() {
        let mut session = session();
        session.start(0).unwrap();
        session.play().unwrap();
        let mut taken = 0;
        for step in 0..=100u64 {
            let outcome = session.tick(step * 10_000_000);
            if outcome.keyframe.is_some() {
                taken += 1;
            }
        }
        assert_eq!(taken, 1);
        assert_eq!(session.track().len(), 1);
    }
}

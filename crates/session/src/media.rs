//! Media playback service contract and an in-memory player.

use std::collections::VecDeque;

use image::{Rgba, RgbaImage};

use reframe_common::clock::ns_to_secs;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_crop_core::sampler::{FrameSource, ReadyState};
use reframe_crop_model::keyframe::PlaybackSnapshot;

/// Notifications from the playback service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Duration and native size are known.
    LoadedMetadata { duration: f64 },
    /// The playback position moved.
    TimeUpdate { current_time: f64 },
    Play,
    Pause,
    /// Playback reached the end of the media.
    Ended,
}

/// The external video transport, seen as a black box.
///
/// Events are only queued between [`subscribe`](Self::subscribe) and
/// [`unsubscribe`](Self::unsubscribe).
pub trait MediaPlayback: FrameSource + Send {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Media duration in seconds, once metadata has loaded.
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f64;

    fn playback_rate(&self) -> f64;

    fn is_playing(&self) -> bool;

    /// Native pixel size of the video, once metadata has loaded.
    fn native_resolution(&self) -> Option<(u32, u32)>;

    fn subscribe(&mut self);

    fn unsubscribe(&mut self);

    /// Next pending event, if any.
    fn poll_event(&mut self) -> Option<PlaybackEvent>;

    /// Bring the playback state up to session time `now_ns`.
    ///
    /// Backends that follow their own clock may ignore this.
    fn refresh(&mut self, now_ns: u64);

    fn play(&mut self) -> ReframeResult<()>;

    fn pause(&mut self) -> ReframeResult<()>;

    fn seek(&mut self, secs: f64) -> ReframeResult<()>;

    fn set_volume(&mut self, volume: f64) -> ReframeResult<()>;

    fn set_playback_rate(&mut self, rate: f64) -> ReframeResult<()>;

    /// Current time, volume, and speed read together.
    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_time: self.current_time(),
            volume: self.volume(),
            playback_speed: self.playback_rate(),
        }
    }
}

/// Validate a volume in `[0, 1]`.
pub fn check_volume(volume: f64) -> ReframeResult<f64> {
    if volume.is_finite() && (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(ReframeError::invalid_parameter(format!(
            "volume must be within [0, 1], got {volume}"
        )))
    }
}

/// Validate a playback rate multiplier.
pub fn check_playback_rate(rate: f64) -> ReframeResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(ReframeError::invalid_parameter(format!(
            "playback rate must be a positive number, got {rate}"
        )))
    }
}

/// In-memory player that advances media time with the session clock.
///
/// Metadata loads on the first refresh; from then on the current frame is
/// a synthetic test pattern at the configured native resolution.
pub struct SimulatedPlayer {
    native: (u32, u32),
    duration: f64,
    current_time: f64,
    volume: f64,
    rate: f64,
    playing: bool,
    frame: Option<RgbaImage>,
    subscribed: bool,
    events: VecDeque<PlaybackEvent>,
    last_refresh_ns: Option<u64>,
    resume_pending: bool,
}

impl SimulatedPlayer {
    pub fn new(native_width: u32, native_height: u32, duration_secs: f64) -> Self {
        Self {
            native: (native_width.max(1), native_height.max(1)),
            duration: duration_secs.max(0.0),
            current_time: 0.0,
            volume: 1.0,
            rate: 1.0,
            playing: false,
            frame: None,
            subscribed: false,
            events: VecDeque::new(),
            last_refresh_ns: None,
            resume_pending: false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Events waiting to be polled.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn emit(&mut self, event: PlaybackEvent) {
        if self.subscribed {
            self.events.push_back(event);
        }
    }

    fn load_metadata(&mut self) {
        let (width, height) = self.native;
        self.frame = Some(test_pattern(width, height));
        tracing::debug!(width, height, duration = self.duration, "Simulated metadata loaded");
        self.emit(PlaybackEvent::LoadedMetadata {
            duration: self.duration,
        });
    }
}

impl FrameSource for SimulatedPlayer {
    fn ready_state(&self) -> ReadyState {
        if self.frame.is_some() {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn current_frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }
}

impl MediaPlayback for SimulatedPlayer {
    fn name(&self) -> &str {
        "simulated"
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> Option<f64> {
        self.frame.as_ref().map(|_| self.duration)
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn native_resolution(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(|_| self.native)
    }

    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.events.clear();
    }

    fn poll_event(&mut self) -> Option<PlaybackEvent> {
        self.events.pop_front()
    }

    fn refresh(&mut self, now_ns: u64) {
        if self.frame.is_none() {
            self.load_metadata();
        }

        let last = self.last_refresh_ns.replace(now_ns);
        if !self.playing {
            return;
        }
        if self.resume_pending {
            self.resume_pending = false;
            return;
        }

        let Some(last) = last else { return };
        let elapsed = ns_to_secs(now_ns.saturating_sub(last));
        if elapsed <= 0.0 {
            return;
        }

        self.current_time += elapsed * self.rate;
        if self.current_time >= self.duration {
            self.current_time = self.duration;
            self.playing = false;
            self.emit(PlaybackEvent::TimeUpdate {
                current_time: self.current_time,
            });
            self.emit(PlaybackEvent::Pause);
            self.emit(PlaybackEvent::Ended);
        } else {
            self.emit(PlaybackEvent::TimeUpdate {
                current_time: self.current_time,
            });
        }
    }

    fn play(&mut self) -> ReframeResult<()> {
        if self.playing {
            return Ok(());
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.playing = true;
        self.resume_pending = true;
        self.emit(PlaybackEvent::Play);
        Ok(())
    }

    fn pause(&mut self) -> ReframeResult<()> {
        if !self.playing {
            return Ok(());
        }
        self.playing = false;
        self.emit(PlaybackEvent::Pause);
        Ok(())
    }

    fn seek(&mut self, secs: f64) -> ReframeResult<()> {
        if !secs.is_finite() {
            return Err(ReframeError::invalid_parameter(format!(
                "seek target must be finite, got {secs}"
            )));
        }
        self.current_time = secs.clamp(0.0, self.duration);
        self.emit(PlaybackEvent::TimeUpdate {
            current_time: self.current_time,
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> ReframeResult<()> {
        self.volume = check_volume(volume)?;
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) -> ReframeResult<()> {
        self.rate = check_playback_rate(rate)?;
        Ok(())
    }
}

/// Diagonal gradient: red follows x, green follows y.
fn test_pattern(width: u32, height: u32) -> RgbaImage {
    let wx = width.saturating_sub(1).max(1);
    let hy = height.saturating_sub(1).max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / wx) as u8,
            (y * 255 / hy) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn drain(player: &mut SimulatedPlayer) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| player.poll_event()).collect()
    }

    #[test]
    fn test_metadata_loads_on_first_refresh() {
        let mut player = SimulatedPlayer::new(960, 540, 10.0);
        player.subscribe();
        assert!(!player.ready_state().has_frame());
        assert_eq!(player.native_resolution(), None);

        player.refresh(0);
        assert!(player.ready_state().has_frame());
        assert_eq!(player.native_resolution(), Some((960, 540)));
        assert_eq!(
            drain(&mut player),
            vec![PlaybackEvent::LoadedMetadata { duration: 10.0 }]
        );
    }

    #[test]
    fn test_time_advances_with_rate() {
        let mut player = SimulatedPlayer::new(64, 36, 10.0);
        player.refresh(0);
        player.set_playback_rate(2.0).unwrap();
        player.play().unwrap();
        player.refresh(100 * MS); // anchors the resume
        player.refresh(1_100 * MS);
        assert!((player.current_time() - 2.0).abs() < 1e-9);

        player.pause().unwrap();
        player.refresh(5_000 * MS);
        assert!((player.current_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reaching_end_pauses() {
        let mut player = SimulatedPlayer::new(64, 36, 1.0);
        player.subscribe();
        player.refresh(0);
        player.play().unwrap();
        player.refresh(0);
        player.refresh(2_000 * MS);
        assert!(!player.is_playing());
        assert_eq!(player.current_time(), 1.0);

        let events = drain(&mut player);
        assert_eq!(
            &events[events.len() - 2..],
            &[PlaybackEvent::Pause, PlaybackEvent::Ended]
        );
    }

    #[test]
    fn test_unsubscribed_player_queues_nothing() {
        let mut player = SimulatedPlayer::new(64, 36, 1.0);
        player.refresh(0);
        player.play().unwrap();
        assert_eq!(player.pending_events(), 0);

        player.subscribe();
        player.pause().unwrap();
        assert_eq!(player.pending_events(), 1);
        player.unsubscribe();
        assert_eq!(player.pending_events(), 0);
    }

    #[test]
    fn test_parameter_validation() {
        let mut player = SimulatedPlayer::new(64, 36, 1.0);
        assert!(player.set_volume(1.5).is_err());
        assert!(player.set_volume(f64::NAN).is_err());
        assert!(player.set_playback_rate(0.0).is_err());
        assert!(player.seek(f64::INFINITY).is_err());
        player.set_volume(0.25).unwrap();
        assert_eq!(player.snapshot().volume, 0.25);
    }
}

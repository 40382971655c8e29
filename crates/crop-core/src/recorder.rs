//! Keyframe recording.
//!
//! While playback runs, a wall-clock interval appends the current crop
//! rectangle and playback parameters to the track. The interval is tied
//! to real time, not media time: at 2x speed consecutive keyframes are
//! about two media seconds apart.

use std::time::Duration;

use reframe_common::clock::IntervalTimer;
use reframe_crop_model::geometry::CropRect;
use reframe_crop_model::keyframe::{Keyframe, KeyframeTrack, PlaybackSnapshot};

/// Appends keyframes on a fixed cadence while playback is active.
#[derive(Debug)]
pub struct KeyframeRecorder {
    interval: Duration,
    timer: Option<IntervalTimer>,
    appended: u64,
    skipped: u64,
}

impl KeyframeRecorder {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
            appended: 0,
            skipped: 0,
        }
    }

    /// Playback started: arm a fresh interval.
    ///
    /// A repeated play notification while already recording keeps the
    /// running interval and its phase.
    pub fn on_play(&mut self, now_ns: u64) {
        if self.timer.is_some() {
            return;
        }
        self.timer = Some(IntervalTimer::every(self.interval, now_ns));
        tracing::debug!(now_ns, "Keyframe recording started");
    }

    /// Playback paused or the session ended: cancel the interval.
    pub fn on_pause(&mut self) {
        if let Some(timer) = self.timer.take() {
            tracing::debug!(
                fired = timer.fired(),
                missed = timer.missed(),
                "Keyframe recording stopped"
            );
        }
    }

    pub fn is_recording(&self) -> bool {
        self.timer.is_some()
    }

    /// Append a keyframe if the interval is due at `now_ns`.
    ///
    /// The playback snapshot is only read when a keyframe is taken.
    /// Degenerate rectangles skip the tick.
    pub fn poll<F>(
        &mut self,
        now_ns: u64,
        rect: &CropRect,
        playback: F,
        track: &mut KeyframeTrack,
    ) -> Option<Keyframe>
    where
        F: FnOnce() -> PlaybackSnapshot,
    {
        let timer = self.timer.as_mut()?;
        if !timer.should_tick(now_ns) {
            return None;
        }

        if rect.is_degenerate() {
            self.skipped += 1;
            tracing::debug!(?rect, "Keyframe tick skipped: degenerate crop rectangle");
            return None;
        }

        let keyframe = Keyframe::capture(rect, &playback());
        track.push(keyframe);
        self.appended += 1;
        tracing::trace!(
            time_stamp = keyframe.time_stamp,
            track_len = track.len(),
            "Keyframe appended"
        );
        Some(keyframe)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn rect() -> CropRect {
        CropRect::new(0.0, 0.0, 202.5, 360.0)
    }

    /// Poll every 10 ms from `from_ms` to `to_ms` inclusive.
    fn run(
        recorder: &mut KeyframeRecorder,
        track: &mut KeyframeTrack,
        from_ms: u64,
        to_ms: u64,
        speed: f64,
    ) {
        let mut t = from_ms;
        while t <= to_ms {
            recorder.poll(
                t * MS,
                &rect(),
                || PlaybackSnapshot {
                    current_time: t as f64 / 1000.0 * speed,
                    volume: 1.0,
                    playback_speed: speed,
                },
                track,
            );
            t += 10;
        }
    }

    #[test]
    fn test_three_keyframes_in_3_2_seconds() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        recorder.on_play(0);
        run(&mut recorder, &mut track, 0, 3200, 1.0);

        assert_eq!(track.len(), 3);
        let times: Vec<f64> = track.iter().map(|k| k.time_stamp).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_idle_recorder_records_nothing() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        run(&mut recorder, &mut track, 0, 5000, 1.0);
        assert!(track.is_empty());
    }

    #[test]
    fn test_pause_cancels_and_play_restarts_phase() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        recorder.on_play(0);
        run(&mut recorder, &mut track, 0, 1500, 1.0);
        assert_eq!(track.len(), 1);

        recorder.on_pause();
        run(&mut recorder, &mut track, 1510, 4000, 1.0);
        assert_eq!(track.len(), 1);

        // Fresh interval: next keyframe one second after the new play.
        recorder.on_play(4_250 * MS);
        run(&mut recorder, &mut track, 4010, 5240, 1.0);
        assert_eq!(track.len(), 1);
        run(&mut recorder, &mut track, 5250, 5250, 1.0);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_wall_clock_cadence_at_double_speed() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        recorder.on_play(0);
        run(&mut recorder, &mut track, 0, 3000, 2.0);

        let times: Vec<f64> = track.iter().map(|k| k.time_stamp).collect();
        assert_eq!(times, vec![2.0, 4.0, 6.0]);
        assert!(track.iter().all(|k| k.playback_speed == 2.0));
    }

    #[test]
    fn test_degenerate_rect_skips_tick() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        recorder.on_play(0);

        let taken = recorder.poll(
            1000 * MS,
            &CropRect::ZERO,
            || panic!("snapshot must not be read for a skipped tick"),
            &mut track,
        );
        assert!(taken.is_none());
        assert!(track.is_empty());
        assert_eq!(recorder.skipped(), 1);
    }

    #[test]
    fn test_repeated_play_keeps_phase() {
        let mut recorder = KeyframeRecorder::new(Duration::from_secs(1));
        let mut track = KeyframeTrack::new();
        recorder.on_play(0);
        recorder.on_play(600 * MS);
        run(&mut recorder, &mut track, 0, 1000, 1.0);
        assert_eq!(track.len(), 1);
    }
}

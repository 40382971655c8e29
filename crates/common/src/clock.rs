//! Clock and timing utilities for the sampling loops.
//!
//! Every Reframe session runs on session-relative monotonic nanoseconds:
//! zero is the moment the session was driven for the first time. This
//! module provides:
//! - Conversions between nanoseconds, seconds, and `Duration`
//! - Interval timers that the session polls cooperatively
//! - `HH:MM:SS` formatting for transport displays

use std::time::Duration;

/// Convert a nanosecond value to seconds.
pub fn ns_to_secs(ns: u64) -> f64 {
    ns as f64 / 1_000_000_000.0
}

/// Convert seconds to nanoseconds. Negative inputs saturate to zero.
pub fn secs_to_ns(secs: f64) -> u64 {
    (secs.max(0.0) * 1_000_000_000.0) as u64
}

/// Format a media time as `HH:MM:SS`, truncating fractional seconds.
///
/// Non-finite or negative inputs render as `00:00:00`.
pub fn format_hms(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let hours = (total / 3600) % 24;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// A periodic timer polled from a cooperative loop.
///
/// The timer is armed at creation and fires for the first time one full
/// interval later. Holding the value is holding the timer; dropping it
/// cancels it.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval_ns: u64,
    next_due_ns: u64,
    fired: u64,
    missed: u64,
}

impl IntervalTimer {
    /// Arm a timer at `now_ns` with the given interval in nanoseconds.
    pub fn start(interval_ns: u64, now_ns: u64) -> Self {
        let interval_ns = interval_ns.max(1);
        Self {
            interval_ns,
            next_due_ns: now_ns.saturating_add(interval_ns),
            fired: 0,
            missed: 0,
        }
    }

    /// Arm a timer from a `Duration` interval.
    pub fn every(interval: Duration, now_ns: u64) -> Self {
        Self::start(interval.as_nanos() as u64, now_ns)
    }

    /// Check whether the timer is due at `current_ns`.
    ///
    /// Returns true at most once per call. Periods that elapsed entirely
    /// between two polls are counted as missed and not replayed.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        if current_ns < self.next_due_ns {
            return false;
        }

        self.fired += 1;
        self.next_due_ns = self.next_due_ns.saturating_add(self.interval_ns);
        while self.next_due_ns <= current_ns {
            self.next_due_ns = self.next_due_ns.saturating_add(self.interval_ns);
            self.missed += 1;
        }
        true
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.interval_ns
    }

    /// Session time of the next tick.
    pub fn next_due_ns(&self) -> u64 {
        self.next_due_ns
    }

    /// Number of ticks that fired.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Number of periods skipped because the loop polled late.
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(secs_to_ns(2.0), 2_000_000_000);
        assert_eq!(secs_to_ns(-3.0), 0);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.9), "00:00:59");
        assert_eq!(format_hms(3_725.0), "01:02:05");
        assert_eq!(format_hms(f64::NAN), "00:00:00");
        assert_eq!(format_hms(-4.0), "00:00:00");
    }

    #[test]
    fn test_interval_first_tick_after_one_period() {
        let mut timer = IntervalTimer::start(1_000_000_000, 0);
        assert!(!timer.should_tick(0));
        assert!(!timer.should_tick(999_999_999));
        assert!(timer.should_tick(1_000_000_000));
        assert!(!timer.should_tick(1_000_000_001));
        assert!(timer.should_tick(2_000_000_000));
        assert_eq!(timer.fired(), 2);
    }

    #[test]
    fn test_interval_phase_follows_start() {
        let mut timer = IntervalTimer::every(Duration::from_millis(10), 5_000_000);
        assert!(!timer.should_tick(14_000_000));
        assert!(timer.should_tick(15_000_000));
        assert_eq!(timer.next_due_ns(), 25_000_000);
    }

    #[test]
    fn test_interval_skips_missed_periods() {
        let mut timer = IntervalTimer::start(10, 0);
        assert!(timer.should_tick(35));
        assert_eq!(timer.missed(), 2);
        assert_eq!(timer.next_due_ns(), 40);
        assert!(!timer.should_tick(39));
        assert!(timer.should_tick(40));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let timer = IntervalTimer::start(0, 0);
        assert_eq!(timer.interval_ns(), 1);
    }
}

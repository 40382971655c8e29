//! Real-time driver for a cropper session.
//!
//! A single tokio task ticks the session at the preview cadence, feeding it
//! session-relative nanoseconds. Scheduled commands are applied just before
//! the tick whose time reaches them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use reframe_common::error::ReframeResult;

use crate::session::{CropSession, SessionCommand, SessionSummary};

/// A command to apply at a given session time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCommand {
    pub at: Duration,
    pub command: SessionCommand,
}

impl ScheduledCommand {
    pub fn new(at: Duration, command: SessionCommand) -> Self {
        Self { at, command }
    }
}

/// Counters reported when the driver returns.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveSummary {
    pub ticks: u64,
    pub elapsed: Duration,
    pub commands_applied: usize,
    pub commands_rejected: usize,
    pub session: SessionSummary,
}

/// Drives a [`CropSession`] from the tokio clock.
#[derive(Debug)]
pub struct SessionDriver {
    tick_interval: Duration,
    deadline: Option<Duration>,
    stop_flag: Arc<AtomicBool>,
}

impl SessionDriver {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            deadline: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop by itself once this much session time has passed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Get a clone of the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Run the session until the stop flag is set or the deadline passes.
    ///
    /// The session is started at time zero and stopped before returning.
    pub async fn run(
        &self,
        session: &mut CropSession,
        mut script: Vec<ScheduledCommand>,
    ) -> ReframeResult<DriveSummary> {
        script.sort_by_key(|c| c.at);
        let mut pending = script.into_iter().peekable();

        let epoch = Instant::now();
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        session.start(0)?;
        tracing::info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            deadline_secs = self.deadline.map(|d| d.as_secs_f64()),
            "Session driver started"
        );

        let mut summary = DriveSummary::default();
        while !self.stop_flag.load(Ordering::Relaxed) {
            interval.tick().await;
            let elapsed = epoch.elapsed();
            if self.deadline.is_some_and(|d| elapsed > d) {
                break;
            }

            while let Some(next) = pending.next_if(|c| c.at <= elapsed) {
                match session.apply(next.command) {
                    Ok(()) => summary.commands_applied += 1,
                    Err(_) => summary.commands_rejected += 1,
                }
            }

            session.tick(elapsed.as_nanos() as u64);
            summary.ticks += 1;
        }

        summary.elapsed = epoch.elapsed();
        summary.session = session.stop()?;
        tracing::info!(
            ticks = summary.ticks,
            keyframes = summary.session.keyframes,
            "Session driver stopped"
        );
        Ok(summary)
    }
}

//! Trigger scheduling for progress persistence.
//!
//! Every trigger source (viewport changes, visibility and focus loss,
//! pointer/keyboard activity, a periodic timer, page-leave) converges on
//! [`FlushScheduler::flush`]. Viewport changes are throttled with a
//! trailing edge so the final position is never dropped; activity is
//! debounced; visibility loss, focus loss and page-leave flush immediately.
//!
//! The loop runs until its signal channel closes or its
//! [`CancellationToken`] fires, then flushes one last time and hands the
//! tracker back.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ProgressConfig;

use super::geometry::Layout;
use super::tracker::ProgressTracker;

/// Signals delivered to a running [`FlushScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerSignal {
    /// The viewport moved or resized.
    Viewport(Layout),
    /// The reading surface became hidden.
    VisibilityLost,
    FocusLost,
    /// Pointer or keyboard activity.
    Activity,
    /// The reader is leaving the page.
    PageLeave,
}

/// Drives a [`ProgressTracker`] from [`TrackerSignal`]s.
pub struct FlushScheduler {
    throttle: Duration,
    debounce: Duration,
    periodic: Duration,
}

impl FlushScheduler {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            throttle: Duration::from_millis(config.viewport_throttle_ms),
            debounce: Duration::from_millis(config.activity_debounce_ms),
            periodic: Duration::from_secs(config.periodic_flush_secs.max(1)),
        }
    }

    /// The single update path: recompute from the latest layout, then
    /// persist if anything changed.
    pub async fn flush(tracker: &mut ProgressTracker) -> bool {
        tracker.refresh();
        tracker.flush().await
    }

    /// Run until `signals` closes or `cancel` fires.
    ///
    /// Intended to be spawned:
    ///
    /// ```rust,ignore
    /// let handle = tokio::spawn(scheduler.run(tracker, rx, cancel.child_token()));
    /// ```
    pub async fn run(
        self,
        mut tracker: ProgressTracker,
        mut signals: mpsc::Receiver<TrackerSignal>,
        cancel: CancellationToken,
    ) -> ProgressTracker {
        let mut periodic = tokio::time::interval_at(Instant::now() + self.periodic, self.periodic);
        periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut next_viewport_at = Instant::now();
        let mut pending_layout: Option<Layout> = None;
        let mut debounce_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("progress scheduler cancelled");
                    break;
                }
                signal = signals.recv() => {
                    let Some(signal) = signal else {
                        tracing::debug!("progress signal channel closed");
                        break;
                    };
                    match signal {
                        TrackerSignal::Viewport(layout) => {
                            let now = Instant::now();
                            if now >= next_viewport_at {
                                tracker.update(layout);
                                pending_layout = None;
                                next_viewport_at = now + self.throttle;
                                Self::flush(&mut tracker).await;
                            } else {
                                pending_layout = Some(layout);
                            }
                        }
                        TrackerSignal::Activity => {
                            debounce_deadline = Some(Instant::now() + self.debounce);
                        }
                        TrackerSignal::VisibilityLost
                        | TrackerSignal::FocusLost
                        | TrackerSignal::PageLeave => {
                            if let Some(layout) = pending_layout.take() {
                                tracker.update(layout);
                            }
                            debounce_deadline = None;
                            Self::flush(&mut tracker).await;
                        }
                    }
                }
                _ = tokio::time::sleep_until(next_viewport_at), if pending_layout.is_some() => {
                    if let Some(layout) = pending_layout.take() {
                        tracker.update(layout);
                        next_viewport_at = Instant::now() + self.throttle;
                        Self::flush(&mut tracker).await;
                    }
                }
                _ = sleep_until_opt(debounce_deadline), if debounce_deadline.is_some() => {
                    debounce_deadline = None;
                    Self::flush(&mut tracker).await;
                }
                _ = periodic.tick() => {
                    Self::flush(&mut tracker).await;
                }
            }
        }

        if let Some(layout) = pending_layout.take() {
            tracker.update(layout);
        }
        Self::flush(&mut tracker).await;
        tracker
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

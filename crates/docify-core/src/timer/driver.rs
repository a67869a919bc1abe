//! One-second tick source for an [`IntervalController`].
//!
//! A single tokio task owns the interval, so ticks are serialized. Drift is
//! not corrected: a late tick delays the schedule instead of bursting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::IntervalController;
use crate::events::Event;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running tick task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TickDriver {
    cancel_tx: watch::Sender<bool>,
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Spawn the tick loop on the current runtime.
    ///
    /// Events returned by `tick()` are forwarded to `events`. The loop
    /// stops when cancelled or when the receiver is gone.
    pub fn spawn(
        controller: Arc<Mutex<IntervalController>>,
        period: Duration,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let cancelled = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel_rx.changed() => break,
                    _ = interval.tick() => {}
                }
                let event = {
                    let Ok(mut timer) = controller.lock() else {
                        tracing::warn!("interval controller lock poisoned, stopping ticks");
                        break;
                    };
                    // cancel() may have run while this task waited on the lock.
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    timer.tick()
                };
                if let Some(event) = event {
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!("tick driver stopped");
        });
        Self {
            cancel_tx,
            cancelled,
            task: Some(task),
        }
    }

    /// Stop ticking. A tick that already holds the controller finishes, but
    /// none starts after this returns, even if the task is waiting on the lock.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

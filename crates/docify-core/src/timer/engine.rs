//! Interval controller implementation.
//!
//! The controller is a plain countdown state machine. It does not own a
//! clock - the caller (normally a [`TickDriver`]) invokes `tick()` once per
//! elapsed second.
//!
//! ## Phase Transitions
//!
//! ```text
//! Work (1500s) -> Break (300s) -> Work (1500s) -> ...
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = IntervalController::new();
//! let gate = timer.subscribe();
//! timer.start();
//! // Once per second:
//! timer.tick(); // Returns Some(Event::PhaseChanged) on a flip
//! ```
//!
//! [`TickDriver`]: super::TickDriver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::gate::EditGate;
use super::phase::{format_clock, Phase};
use crate::events::Event;

/// Countdown snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub running: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: Phase::Work.duration_secs(),
            running: false,
        }
    }
}

/// The live transition message. Only one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub phase: Phase,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Work/break countdown.
#[derive(Debug)]
pub struct IntervalController {
    state: TimerState,
    notification: Option<Notification>,
    phase_tx: watch::Sender<Phase>,
}

impl IntervalController {
    /// Work phase, full duration, stopped.
    pub fn new() -> Self {
        let state = TimerState::default();
        let (phase_tx, _rx) = watch::channel(state.phase);
        Self {
            state,
            notification: None,
            phase_tx,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_editable(&self) -> bool {
        self.state.phase.allows_editing()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Remaining time as `m:ss`.
    pub fn format_remaining(&self) -> String {
        format_clock(self.state.remaining_seconds)
    }

    /// A new read-only handle on the phase signal.
    pub fn subscribe(&self) -> EditGate {
        EditGate::new(self.phase_tx.subscribe())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            running: self.state.running,
            remaining_secs: self.state.remaining_seconds,
            display: self.format_remaining(),
            editable: self.is_editable(),
            notification: self.notification.as_ref().map(|n| n.message.clone()),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resume the countdown from wherever it stands.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.running {
            return None;
        }
        self.state.running = true;
        tracing::debug!(
            phase = %self.state.phase,
            remaining = self.state.remaining_seconds,
            "timer started"
        );
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::default();
        self.notification = None;
        self.phase_tx.send_replace(Phase::Work);
        tracing::debug!("timer reset");
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Call once per elapsed second. Returns `Some(Event::PhaseChanged)`
    /// when the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return None;
        }
        Some(self.flip())
    }

    /// Drop the live notification, returning it if there was one.
    pub fn dismiss_notification(&mut self) -> Option<Event> {
        let dismissed = self.notification.take()?;
        Some(Event::NotificationDismissed {
            message: dismissed.message,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flip(&mut self) -> Event {
        let phase = self.state.phase.next();
        let at = Utc::now();
        self.state.phase = phase;
        self.state.remaining_seconds = phase.duration_secs();
        self.notification = Some(Notification {
            phase,
            message: phase.entry_message().to_string(),
            at,
        });
        self.phase_tx.send_replace(phase);
        tracing::info!(phase = %phase, "interval phase changed");
        Event::PhaseChanged {
            phase,
            message: phase.entry_message().to_string(),
            duration_secs: phase.duration_secs(),
            at,
        }
    }
}

impl Default for IntervalController {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every timer state change produces an Event.
/// The tick driver forwards them to whoever renders the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Countdown hit zero and the phase flipped.
    PhaseChanged {
        phase: Phase,
        message: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    NotificationDismissed {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_secs: u64,
        display: String,
        editable: bool,
        notification: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The phase entered, if this event is a transition.
    pub fn entered_phase(&self) -> Option<Phase> {
        match self {
            Event::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

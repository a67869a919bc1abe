use serde::{Deserialize, Serialize};

/// Work interval length in seconds (25 minutes).
pub const WORK_SECONDS: u64 = 25 * 60;
/// Break interval length in seconds (5 minutes).
pub const BREAK_SECONDS: u64 = 5 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Work,
    Break,
}

impl Phase {
    /// Fixed duration of this phase in seconds.
    pub fn duration_secs(self) -> u64 {
        match self {
            Phase::Work => WORK_SECONDS,
            Phase::Break => BREAK_SECONDS,
        }
    }

    /// The phase that follows this one.
    pub fn next(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    /// Message announced when this phase begins.
    pub fn entry_message(self) -> &'static str {
        match self {
            Phase::Break => "Time for a break!",
            Phase::Work => "Break is over! Back to work.",
        }
    }

    /// Editing is only allowed while working.
    pub fn allows_editing(self) -> bool {
        self == Phase::Work
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Work => f.write_str("work"),
            Phase::Break => f.write_str("break"),
        }
    }
}

/// Format a second count as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

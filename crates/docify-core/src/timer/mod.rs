mod driver;
mod engine;
mod gate;
mod phase;

pub use driver::{TickDriver, TICK_PERIOD};
pub use engine::{IntervalController, Notification, TimerState};
pub use gate::EditGate;
pub use phase::{format_clock, Phase, BREAK_SECONDS, WORK_SECONDS};

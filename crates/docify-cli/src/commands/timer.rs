use clap::Subcommand;
use docify_core::IntervalController;

use super::CommandResult;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run ticks instantly on a fresh timer and print what happens
    Preview {
        /// Number of one-second ticks to simulate
        #[arg(long, default_value = "0")]
        ticks: u64,
    },
}

pub fn run(action: TimerAction) -> CommandResult {
    match action {
        TimerAction::Preview { ticks } => {
            let mut timer = IntervalController::new();
            if let Some(event) = timer.start() {
                println!("{}", serde_json::to_string(&event)?);
            }
            for _ in 0..ticks {
                if let Some(event) = timer.tick() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&timer.snapshot())?);
        }
    }
    Ok(())
}

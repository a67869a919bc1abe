//! Terminal rendition of the editing page.
//!
//! Typed lines accumulate into a draft; a lone `.` is the blur that saves it.
//! The timer runs in the background and locks editing during breaks.

use std::sync::{Arc, Mutex, PoisonError};

use clap::Args;
use docify_core::timer::TICK_PERIOD;
use docify_core::{
    Config, DocumentSession, DocumentStore, Event, IntervalController, LoadOutcome, Phase,
    RejectReason, SaveOutcome, TickDriver,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{http_store, resolve_user, runtime, CommandResult};

#[derive(Args)]
pub struct EditArgs {
    /// Document identifier
    doc_id: String,
    /// User id (defaults to config `user_id`)
    #[arg(long)]
    user: Option<String>,
    /// Start the timer immediately
    #[arg(long)]
    start: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Start,
    Reset,
    Dismiss,
    Status,
    Show,
    Help,
    Quit,
    /// Edit surface lost focus.
    Commit,
    Text(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim_end() {
            ":start" => Input::Start,
            ":reset" => Input::Reset,
            ":dismiss" => Input::Dismiss,
            ":status" => Input::Status,
            ":show" => Input::Show,
            ":help" => Input::Help,
            ":quit" | ":q" => Input::Quit,
            "." => Input::Commit,
            _ => Input::Text(line.trim_end_matches('\r').to_string()),
        }
    }
}

const HELP: &str = "\
commands: :start :reset :dismiss :status :show :help :quit
type text to edit, a single '.' on its own line saves";

pub fn run(args: EditArgs) -> CommandResult {
    let config = Config::load()?;
    let user = resolve_user(args.user, &config)?;
    let store = http_store(&config)?;
    runtime()?.block_on(page(
        store,
        user,
        args.doc_id,
        args.start,
        config.notifications.enabled,
    ))
}

async fn page<S: DocumentStore>(
    store: Arc<S>,
    user: String,
    doc_id: String,
    autostart: bool,
    notify: bool,
) -> CommandResult {
    let timer = Arc::new(Mutex::new(IntervalController::new()));
    let gate = with_timer(&timer, |t| t.subscribe());
    let session = DocumentSession::new(store, user, doc_id, gate);
    let stdin = BufReader::new(tokio::io::stdin());
    run_page(&timer, &session, stdin, autostart, notify).await
}

/// Drive one page until `:quit` or end of input, then tear it down.
async fn run_page<S, R>(
    timer: &Arc<Mutex<IntervalController>>,
    session: &DocumentSession<S>,
    input: R,
    autostart: bool,
    notify: bool,
) -> CommandResult
where
    S: DocumentStore,
    R: AsyncBufRead + Unpin,
{
    let (tx, mut events) = mpsc::unbounded_channel();
    let mut driver = TickDriver::spawn(Arc::clone(timer), TICK_PERIOD, tx);

    println!("{HELP}");
    match session.load().await {
        LoadOutcome::Loaded => println!("{}", session.content()),
        LoadOutcome::Failed { message } => eprintln!("error: {message}"),
        LoadOutcome::Discarded => {}
    }
    if autostart {
        with_timer(timer, |t| t.start());
    }

    let mut lines = input.lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => render_event(&event, notify),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = Input::parse(&line);
                tracing::trace!(?command, "page input");
                match command {
                    Input::Quit => break,
                    Input::Start => {
                        with_timer(timer, |t| t.start());
                        print_status(timer);
                    }
                    Input::Reset => {
                        with_timer(timer, |t| t.reset());
                        print_status(timer);
                    }
                    Input::Dismiss => {
                        with_timer(timer, |t| t.dismiss_notification());
                    }
                    Input::Status => print_status(timer),
                    Input::Show => println!("{}", session.content()),
                    Input::Help => println!("{HELP}"),
                    Input::Commit => render_save(&session.complete_edit().await),
                    Input::Text(text) => {
                        let base = session.draft().unwrap_or_else(|| session.content());
                        if !session.update_draft(append_line(base, &text)) {
                            println!("{}", RejectReason::OnBreak.message());
                        }
                    }
                }
            }
        }
    }

    driver.cancel();
    session.close();
    tracing::debug!(document = session.document_id(), "page closed");
    Ok(())
}

fn with_timer<R>(
    timer: &Mutex<IntervalController>,
    f: impl FnOnce(&mut IntervalController) -> R,
) -> R {
    let mut guard = timer.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

fn append_line(mut base: String, line: &str) -> String {
    if !base.is_empty() {
        base.push('\n');
    }
    base.push_str(line);
    base
}

fn print_status(timer: &Mutex<IntervalController>) {
    let (state, display, notice) = with_timer(timer, |t| {
        (
            t.state(),
            t.format_remaining(),
            t.notification().map(|n| n.message.clone()),
        )
    });
    let run = if state.running { "running" } else { "stopped" };
    println!("[{} {display} {run}]", state.phase);
    if let Some(notice) = notice {
        println!("  {notice}");
    }
}

fn render_event(event: &Event, notify: bool) {
    if let Event::PhaseChanged { phase, message, .. } = event {
        if notify {
            println!("*** {message} ***");
        }
        if *phase == Phase::Break {
            println!("{}", RejectReason::OnBreak.message());
        }
    }
}

fn render_save(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Saved => println!("saved"),
        SaveOutcome::Failed { message } => eprintln!("error: {message}"),
        SaveOutcome::Rejected { reason } => println!("{}", reason.message()),
        SaveOutcome::NothingToSave => println!("nothing to save"),
        SaveOutcome::Discarded => {}
    }
}

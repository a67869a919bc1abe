use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};
use docify_core::{Config, DocumentSession, EditGate, LoadOutcome, Phase};
use serde_json::json;

use super::{http_store, resolve_user, runtime, CommandResult};

#[derive(Args)]
pub struct DocTarget {
    /// Document identifier
    doc_id: String,
    /// User id (defaults to config `user_id`)
    #[arg(long)]
    user: Option<String>,
}

#[derive(Subcommand)]
pub enum DocAction {
    /// Fetch a document and print it
    Show {
        #[command(flatten)]
        target: DocTarget,
    },
    /// Overwrite a document
    #[command(group(ArgGroup::new("source").required(true).args(["content", "file"])))]
    Save {
        #[command(flatten)]
        target: DocTarget,
        /// New content
        #[arg(long)]
        content: Option<String>,
        /// Read new content from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub fn run(action: DocAction) -> CommandResult {
    let config = Config::load()?;
    let store = http_store(&config)?;
    let rt = runtime()?;

    match action {
        DocAction::Show { target } => {
            let user = resolve_user(target.user, &config)?;
            // No timer outside the editor: always in a work phase.
            let gate = EditGate::fixed(Phase::Work);
            let session = DocumentSession::new(store, user, target.doc_id, gate);
            let outcome = rt.block_on(session.load());
            let report = json!({
                "document_id": session.document_id(),
                "result": outcome,
                "content": session.content(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let LoadOutcome::Failed { message } = outcome {
                return Err(message.into());
            }
        }
        DocAction::Save {
            target,
            content,
            file,
        } => {
            let user = resolve_user(target.user, &config)?;
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err("either --content or --file is required".into()),
            };
            let gate = EditGate::fixed(Phase::Work);
            let session = DocumentSession::new(store, user, target.doc_id, gate);
            let outcome = rt.block_on(session.save(content));
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let Some(message) = session.last_error() {
                return Err(message.into());
            }
        }
    }
    Ok(())
}

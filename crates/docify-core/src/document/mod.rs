//! Remote document synchronization gated by the interval timer.

pub mod protocol;
mod session;
mod store;

pub use session::{DocumentSession, LoadOutcome, LoadState, RejectReason, SaveOutcome};
pub use store::{DocumentStore, HttpDocumentStore, MemoryDocumentStore};

//! # Docify Core Library
//!
//! Business logic for the Docify editing page: a work/break interval timer
//! that gates editing, and a document session synchronized with a remote
//! store. The CLI binary is a thin terminal layer over the same library.
//!
//! ## Architecture
//!
//! - **Interval Controller**: a countdown state machine that requires the
//!   caller to invoke `tick()` once per second
//! - **Tick Driver**: the tokio task that does the calling, cancelable on teardown
//! - **Document Session**: load-on-start, save-on-blur, editable only while working
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`IntervalController`]: Core timer state machine
//! - [`EditGate`]: One-way phase signal from timer to session
//! - [`DocumentSession`]: Content owner and persistence coordinator
//! - [`DocumentStore`]: Trait for remote document backends
//! - [`Config`]: Application configuration management

pub mod document;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use document::{
    DocumentSession, DocumentStore, HttpDocumentStore, LoadOutcome, MemoryDocumentStore,
    RejectReason, SaveOutcome,
};
pub use error::{ConfigError, CoreError, DocumentError};
pub use events::Event;
pub use storage::Config;
pub use timer::{EditGate, IntervalController, Phase, TickDriver, TimerState};

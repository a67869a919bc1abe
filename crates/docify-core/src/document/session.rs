//! Document session: one document, loaded once, saved on edit completion.
//!
//! A session is a cloneable handle over shared state so the page can tear it
//! down while a load or save is still outstanding. Results that arrive after
//! [`DocumentSession::close`] are dropped without touching the state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::store::DocumentStore;
use crate::timer::EditGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    NotStarted,
    Pending,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    Failed { message: String },
    /// The session was closed before the answer arrived.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Editing is disabled during breaks.
    OnBreak,
    /// The initial load has not come back yet.
    LoadPending,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::OnBreak => "Docify is disabled during breaks",
            RejectReason::LoadPending => "Document is still loading",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    Failed { message: String },
    /// Guarded before any request was sent.
    Rejected { reason: RejectReason },
    NothingToSave,
    Discarded,
}

impl SaveOutcome {
    /// Whether the store answered this save.
    pub fn was_sent(&self) -> bool {
        matches!(self, SaveOutcome::Saved | SaveOutcome::Failed { .. })
    }
}

#[derive(Debug)]
struct SessionState {
    content: String,
    last_error: Option<String>,
    draft: Option<String>,
    load_state: LoadState,
    closed: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            content: String::new(),
            last_error: None,
            draft: None,
            load_state: LoadState::NotStarted,
            closed: false,
        }
    }
}

pub struct DocumentSession<S> {
    store: Arc<S>,
    user_id: Arc<str>,
    document_id: Arc<str>,
    gate: EditGate,
    state: Arc<Mutex<SessionState>>,
}

impl<S> Clone for DocumentSession<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            user_id: Arc::clone(&self.user_id),
            document_id: Arc::clone(&self.document_id),
            gate: self.gate.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> std::fmt::Debug for DocumentSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("user_id", &self.user_id)
            .field("document_id", &self.document_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> DocumentSession<S> {
    pub fn new(
        store: Arc<S>,
        user_id: impl Into<String>,
        document_id: impl Into<String>,
        gate: EditGate,
    ) -> Self {
        Self {
            store,
            user_id: Arc::from(user_id.into()),
            document_id: Arc::from(document_id.into()),
            gate,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn content(&self) -> String {
        self.lock().content.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn draft(&self) -> Option<String> {
        self.lock().draft.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state() == LoadState::Finished
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// `phase == Work`, read from the timer's gate.
    pub fn is_editable(&self) -> bool {
        self.gate.is_editable()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the document once. Failures land in `last_error`.
    pub async fn load(&self) -> LoadOutcome {
        {
            let mut state = self.lock();
            if state.closed {
                return LoadOutcome::Discarded;
            }
            state.load_state = LoadState::Pending;
        }
        tracing::debug!(document = %self.document_id, "loading document");

        let result = self.store.fetch(&self.user_id, &self.document_id).await;

        let mut state = self.lock();
        if state.closed {
            tracing::warn!(document = %self.document_id, "session closed, dropping load result");
            return LoadOutcome::Discarded;
        }
        state.load_state = LoadState::Finished;
        match result {
            Ok(content) => {
                tracing::info!(
                    document = %self.document_id,
                    bytes = content.len(),
                    "document loaded"
                );
                state.content = content;
                state.last_error = None;
                LoadOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(document = %self.document_id, error = %err, "document load failed");
                let message = err.message().to_string();
                state.last_error = Some(message.clone());
                LoadOutcome::Failed { message }
            }
        }
    }

    /// Persist `new_content`. Rejected without a request during a break or
    /// while the initial load is outstanding. The edit is kept in memory even
    /// if the store refuses it.
    pub async fn save(&self, new_content: impl Into<String>) -> SaveOutcome {
        let new_content = new_content.into();
        {
            let mut state = self.lock();
            if state.closed {
                return SaveOutcome::Discarded;
            }
            if let Some(reason) = self.guard(&state) {
                tracing::debug!(document = %self.document_id, ?reason, "save rejected");
                return SaveOutcome::Rejected { reason };
            }
            state.content = new_content.clone();
        }
        tracing::debug!(document = %self.document_id, "saving document");

        let result = self
            .store
            .save(&self.user_id, &self.document_id, &new_content)
            .await;

        let mut state = self.lock();
        if state.closed {
            tracing::warn!(document = %self.document_id, "session closed, dropping save result");
            return SaveOutcome::Discarded;
        }
        match result {
            Ok(()) => {
                tracing::info!(document = %self.document_id, "document saved");
                state.last_error = None;
                SaveOutcome::Saved
            }
            Err(err) => {
                tracing::warn!(document = %self.document_id, error = %err, "document save failed");
                let message = err.message().to_string();
                state.last_error = Some(message.clone());
                SaveOutcome::Failed { message }
            }
        }
    }

    /// Record keystroke-level input. Nothing is sent until
    /// [`complete_edit`](Self::complete_edit). Returns false when refused.
    pub fn update_draft(&self, text: impl Into<String>) -> bool {
        let mut state = self.lock();
        if state.closed || !self.gate.is_editable() {
            return false;
        }
        state.draft = Some(text.into());
        true
    }

    /// The edit surface lost focus: save the pending draft, if any.
    pub async fn complete_edit(&self) -> SaveOutcome {
        let Some(draft) = self.lock().draft.clone() else {
            return SaveOutcome::NothingToSave;
        };
        let outcome = self.save(draft.clone()).await;
        if outcome.was_sent() {
            let mut state = self.lock();
            // Keep input typed while the save was in flight.
            if state.draft.as_deref() == Some(draft.as_str()) {
                state.draft = None;
            }
        }
        outcome
    }

    /// Tear the session down. Outstanding results are discarded on arrival.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            tracing::debug!(document = %self.document_id, "session closed");
        }
        state.closed = true;
        state.draft = None;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn guard(&self, state: &SessionState) -> Option<RejectReason> {
        if !self.gate.is_editable() {
            Some(RejectReason::OnBreak)
        } else if state.load_state == LoadState::Pending {
            Some(RejectReason::LoadPending)
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::timer::{IntervalController, Phase};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Answers from a script and records every call.
    #[derive(Default)]
    struct ScriptedStore {
        fetches: Mutex<VecDeque<Result<String, DocumentError>>>,
        saves: Mutex<VecDeque<Result<(), DocumentError>>>,
        saved: Mutex<Vec<String>>,
        calls: AtomicUsize,
        hold: Option<Arc<Semaphore>>,
    }

    impl ScriptedStore {
        fn fetching(result: Result<String, DocumentError>) -> Self {
            let store = Self::default();
            store.fetches.lock().unwrap().push_back(result);
            store
        }

        fn saving(self, result: Result<(), DocumentError>) -> Self {
            self.saves.lock().unwrap().push_back(result);
            self
        }

        fn held(mut self, hold: Arc<Semaphore>) -> Self {
            self.hold = Some(hold);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DocumentStore for ScriptedStore {
        async fn fetch(&self, _user_id: &str, _document_id: &str) -> Result<String, DocumentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                let _permit = hold.acquire().await;
            }
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DocumentError::Transport("unscripted fetch".into())))
        }

        async fn save(
            &self,
            _user_id: &str,
            _document_id: &str,
            content: &str,
        ) -> Result<(), DocumentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                let _permit = hold.acquire().await;
            }
            self.saved.lock().unwrap().push(content.to_string());
            self.saves.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn session(
        store: ScriptedStore,
        gate: EditGate,
    ) -> (DocumentSession<ScriptedStore>, Arc<ScriptedStore>) {
        let store = Arc::new(store);
        let session = DocumentSession::new(Arc::clone(&store), "u1", "d1", gate);
        (session, store)
    }

    fn work() -> EditGate {
        EditGate::fixed(Phase::Work)
    }

    async fn wait_for_calls(store: &ScriptedStore, n: usize) {
        while store.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn load_success_sets_content() {
        let (session, _) = session(ScriptedStore::fetching(Ok("Hello".into())), work());
        assert_eq!(session.load().await, LoadOutcome::Loaded);
        assert_eq!(session.content(), "Hello");
        assert_eq!(session.last_error(), None);
        assert!(session.is_loaded());
    }

    #[tokio::test]
    async fn load_failure_keeps_initial_content() {
        let store = ScriptedStore::fetching(Err(DocumentError::Remote("not found".into())));
        let (session, _) = session(store, work());
        assert_eq!(
            session.load().await,
            LoadOutcome::Failed {
                message: "not found".into()
            }
        );
        assert_eq!(session.content(), "");
        assert_eq!(session.last_error().as_deref(), Some("not found"));
        assert!(session.is_loaded());
    }

    #[tokio::test]
    async fn load_success_clears_previous_error() {
        let (session, store) = session(
            ScriptedStore::fetching(Err(DocumentError::Transport("offline".into()))),
            work(),
        );
        session.load().await;
        store.fetches.lock().unwrap().push_back(Ok("Back".into()));
        session.load().await;
        assert_eq!(session.content(), "Back");
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn save_success_replaces_content() {
        let (session, store) = session(ScriptedStore::fetching(Ok("Hello".into())), work());
        session.load().await;
        assert_eq!(session.save("Updated text").await, SaveOutcome::Saved);
        assert_eq!(session.content(), "Updated text");
        assert_eq!(session.last_error(), None);
        assert_eq!(*store.saved.lock().unwrap(), vec!["Updated text".to_string()]);
    }

    #[tokio::test]
    async fn save_failure_retains_edit() {
        let store = ScriptedStore::fetching(Ok("Hello".into()))
            .saving(Err(DocumentError::Remote("server error".into())));
        let (session, _) = session(store, work());
        session.load().await;
        assert_eq!(
            session.save("X").await,
            SaveOutcome::Failed {
                message: "server error".into()
            }
        );
        assert_eq!(session.content(), "X");
        assert_eq!(session.last_error().as_deref(), Some("server error"));
    }

    #[tokio::test]
    async fn failed_save_does_not_block_next_save() {
        let store = ScriptedStore::default()
            .saving(Err(DocumentError::Remote("server error".into())))
            .saving(Ok(()));
        let (session, store) = session(store, work());
        session.save("first").await;
        assert_eq!(session.save("second").await, SaveOutcome::Saved);
        assert_eq!(session.last_error(), None);
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn save_during_break_sends_nothing() {
        let (session, store) = session(
            ScriptedStore::fetching(Ok("Hello".into())),
            EditGate::fixed(Phase::Break),
        );
        session.load().await;
        let calls = store.calls();

        assert_eq!(
            session.save("nope").await,
            SaveOutcome::Rejected {
                reason: RejectReason::OnBreak
            }
        );
        assert_eq!(store.calls(), calls);
        assert_eq!(session.content(), "Hello");
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn editability_follows_timer() {
        let mut timer = IntervalController::new();
        let (session, store) = session(ScriptedStore::default(), timer.subscribe());
        assert!(session.is_editable());

        timer.start();
        for _ in 0..1500 {
            timer.tick();
        }
        assert!(!session.is_editable());
        assert!(!session.save("x").await.was_sent());
        assert_eq!(store.calls(), 0);

        for _ in 0..300 {
            timer.tick();
        }
        assert!(session.is_editable());
        assert_eq!(session.save("x").await, SaveOutcome::Saved);
    }

    #[tokio::test]
    async fn save_waits_for_initial_load() {
        let hold = Arc::new(Semaphore::new(0));
        let (session, store) = session(
            ScriptedStore::fetching(Ok("Hello".into())).held(Arc::clone(&hold)),
            work(),
        );
        let loader = session.clone();
        let load = tokio::spawn(async move { loader.load().await });
        wait_for_calls(&store, 1).await;

        assert_eq!(
            session.save("too early").await,
            SaveOutcome::Rejected {
                reason: RejectReason::LoadPending
            }
        );
        assert_eq!(store.calls(), 1);

        hold.add_permits(1);
        assert_eq!(load.await.unwrap(), LoadOutcome::Loaded);
        assert_eq!(session.content(), "Hello");
    }

    #[tokio::test]
    async fn load_result_after_close_is_discarded() {
        let hold = Arc::new(Semaphore::new(0));
        let (session, store) = session(
            ScriptedStore::fetching(Ok("Hello".into())).held(Arc::clone(&hold)),
            work(),
        );
        let loader = session.clone();
        let load = tokio::spawn(async move { loader.load().await });
        wait_for_calls(&store, 1).await;

        session.close();
        hold.add_permits(1);
        assert_eq!(load.await.unwrap(), LoadOutcome::Discarded);
        assert_eq!(session.content(), "");
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn save_result_after_close_is_discarded() {
        let hold = Arc::new(Semaphore::new(0));
        let store = ScriptedStore::default()
            .saving(Err(DocumentError::Remote("server error".into())))
            .held(Arc::clone(&hold));
        let (session, store) = session(store, work());
        let saver = session.clone();
        let save = tokio::spawn(async move { saver.save("late").await });
        wait_for_calls(&store, 1).await;

        session.close();
        hold.add_permits(1);
        assert_eq!(save.await.unwrap(), SaveOutcome::Discarded);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.save("after").await, SaveOutcome::Discarded);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn in_flight_save_completes_when_break_starts() {
        let hold = Arc::new(Semaphore::new(0));
        let mut timer = IntervalController::new();
        let (session, store) = session(
            ScriptedStore::default().held(Arc::clone(&hold)),
            timer.subscribe(),
        );
        let saver = session.clone();
        let save = tokio::spawn(async move { saver.save("mid-flight").await });
        wait_for_calls(&store, 1).await;

        timer.start();
        for _ in 0..1500 {
            timer.tick();
        }
        assert!(!session.is_editable());

        hold.add_permits(1);
        assert_eq!(save.await.unwrap(), SaveOutcome::Saved);
        assert_eq!(session.content(), "mid-flight");
    }

    #[tokio::test]
    async fn draft_is_sent_only_on_completion() {
        let (session, store) = session(ScriptedStore::default(), work());
        assert!(session.update_draft("He"));
        assert!(session.update_draft("Hello"));
        assert_eq!(store.calls(), 0);

        assert_eq!(session.complete_edit().await, SaveOutcome::Saved);
        assert_eq!(*store.saved.lock().unwrap(), vec!["Hello".to_string()]);
        assert_eq!(session.draft(), None);
        assert_eq!(session.complete_edit().await, SaveOutcome::NothingToSave);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn draft_refused_during_break() {
        let (session, store) = session(ScriptedStore::default(), EditGate::fixed(Phase::Break));
        assert!(!session.update_draft("typing"));
        assert_eq!(session.complete_edit().await, SaveOutcome::NothingToSave);
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn outcomes_serialize_with_tag() {
        let json = serde_json::to_value(SaveOutcome::Rejected {
            reason: RejectReason::OnBreak,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "rejected", "reason": "on_break"}));
    }
}

use tokio::sync::watch;

use super::phase::Phase;

/// Read-only view of the controller's current phase.
///
/// This is the only link between the timer and a document session: the
/// session asks it whether editing is allowed and has no way to write back.
#[derive(Debug, Clone)]
pub struct EditGate {
    rx: watch::Receiver<Phase>,
}

impl EditGate {
    pub(crate) fn new(rx: watch::Receiver<Phase>) -> Self {
        Self { rx }
    }

    /// A gate fixed at `phase`, for sessions that run without a timer.
    pub fn fixed(phase: Phase) -> Self {
        let (_tx, rx) = watch::channel(phase);
        Self { rx }
    }

    pub fn phase(&self) -> Phase {
        *self.rx.borrow()
    }

    /// `phase == Work`, always.
    pub fn is_editable(&self) -> bool {
        self.phase().allows_editing()
    }

    /// Wait for the next phase publication. Returns `None` once the
    /// controller is gone.
    pub async fn changed(&mut self) -> Option<Phase> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

//! Transfer Handle
//!
//! Caller-side reference to one in-flight run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::TransferError;
use super::state::Stage;
use super::types::{Outcome, TransferId, TransferSnapshot};

/// Control flags shared between a run, its handle and the coordinator
#[derive(Debug, Clone)]
pub(crate) struct RunControl {
    id: TransferId,
    token: CancellationToken,
    reset: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
}

impl RunControl {
    pub(crate) fn new(id: TransferId, token: CancellationToken) -> Self {
        Self {
            id,
            token,
            reset: Arc::new(AtomicBool::new(false)),
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn id(&self) -> TransferId {
        self.id
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and drop the outcome from the terminal publication
    pub(crate) fn cancel_and_reset(&self) {
        self.reset.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn is_reset(&self) -> bool {
        self.reset.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Handle to one started run
///
/// Dropping the handle detaches from the run; it still reaches `Cleanup`.
pub struct TransferHandle {
    control: RunControl,
    state: watch::Receiver<TransferSnapshot>,
    join: JoinHandle<Result<Outcome, TransferError>>,
}

impl TransferHandle {
    pub(crate) fn new(
        control: RunControl,
        state: watch::Receiver<TransferSnapshot>,
        join: JoinHandle<Result<Outcome, TransferError>>,
    ) -> Self {
        Self {
            control,
            state,
            join,
        }
    }

    pub fn id(&self) -> TransferId {
        self.control.id()
    }

    /// Request cancellation. Idempotent and non-blocking; takes effect at the
    /// next checkpoint and never interrupts `Cleanup`.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// True once the run has published its terminal snapshot
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Current stage of this run, `None` once terminal or after being abandoned
    pub fn stage(&self) -> Option<Stage> {
        let snapshot = self.state.borrow();
        if snapshot.run_id == Some(self.control.id()) {
            snapshot.stage
        } else {
            None
        }
    }

    /// Wait for the run to finish.
    ///
    /// Success and business failures come back as `Ok`. A cancelled run
    /// returns `Err(TransferError::Cancelled)` after its finalizer completed.
    pub async fn wait(self) -> Result<Outcome, TransferError> {
        self.join.await?
    }
}

//! Transfer Coordinator
//!
//! Long-lived owner of transfer runs. Spawns one task per run on the injected
//! runtime, publishes the observable snapshot and routes cancellation.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::adapters::{Finalizer, TransferStages};
use super::error::TransferError;
use super::handle::{RunControl, TransferHandle};
use super::state::Stage;
use super::types::{Balances, Outcome, TransferId, TransferSnapshot, WorkflowInput};
use crate::money::parse_transfer_amount;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Transfer Coordinator - owns runs and their published state
pub struct TransferCoordinator {
    stages: Arc<dyn TransferStages>,
    finalizer: Arc<dyn Finalizer>,
    state: Arc<watch::Sender<TransferSnapshot>>,
    runtime: Handle,
    /// Root token; every run gets a child of it
    shutdown: CancellationToken,
    active: Mutex<Option<RunControl>>,
}

impl TransferCoordinator {
    /// Create a coordinator whose runs are spawned on `runtime`
    pub fn new(
        balances: Balances,
        stages: Arc<dyn TransferStages>,
        finalizer: Arc<dyn Finalizer>,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(TransferSnapshot::idle(balances));
        Self {
            stages,
            finalizer,
            state: Arc::new(state),
            runtime,
            shutdown: CancellationToken::new(),
            active: Mutex::new(None),
        }
    }

    /// Start a transfer of `amount` from source to destination.
    ///
    /// Balances are snapshotted from the latest published state. A run that
    /// is still in flight is cancelled and abandoned: it still runs its
    /// finalizer but no longer publishes.
    pub fn start(&self, amount: impl Into<String>) -> TransferHandle {
        let mut active = lock(&self.active);

        if let Some(previous) = active.take()
            && !previous.is_done()
            && !previous.is_cancelled()
        {
            warn!(
                transfer_id = %previous.id(),
                "Starting a new transfer while another is in flight, abandoning it"
            );
            previous.cancel();
        }

        let id = TransferId::new();
        let control = RunControl::new(id, self.shutdown.child_token());

        // Re-read inside the write so an abandoned run's last commit is seen.
        let mut balances = self.state.borrow().balances;
        self.state.send_modify(|snap| {
            snap.run_id = Some(id);
            snap.stage = Some(Stage::Idle);
            snap.is_running = true;
            snap.outcome = None;
            balances = snap.balances;
        });

        let input = WorkflowInput::new(balances, amount);
        info!(
            transfer_id = %id,
            amount = input.amount(),
            source = %balances.source,
            destination = %balances.destination,
            stages = self.stages.name(),
            "Transfer started"
        );

        let run = TransferRun {
            control: control.clone(),
            state: self.state.clone(),
            stages: self.stages.clone(),
            finalizer: self.finalizer.clone(),
            stage: Stage::Idle,
            balances: input.balances(),
            input,
        };
        let span = info_span!("transfer", transfer_id = %id);
        let join = self.runtime.spawn(run.execute().instrument(span));

        *active = Some(control.clone());
        TransferHandle::new(control, self.state.subscribe(), join)
    }

    /// Cancel the active run, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some(control) = lock(&self.active).as_ref() {
            debug!(transfer_id = %control.id(), "Cancel requested");
            control.cancel();
        }
    }

    /// Cancel the active run and clear the published progress right away.
    ///
    /// The run still enters `Cleanup`; its terminal snapshot carries no outcome.
    pub fn cancel_and_reset(&self) {
        if let Some(control) = lock(&self.active).as_ref() {
            debug!(transfer_id = %control.id(), "Cancel and reset requested");
            control.cancel_and_reset();
        }
        self.state.send_modify(|snap| {
            snap.is_running = false;
            snap.stage = None;
            snap.outcome = None;
        });
    }

    /// Cancel every run owned by this coordinator, current and future
    pub fn shutdown(&self) {
        info!("Transfer coordinator shutting down");
        self.shutdown.cancel();
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> watch::Receiver<TransferSnapshot> {
        self.state.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TransferSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }
}

impl Drop for TransferCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// State owned by one spawned run
struct TransferRun {
    control: RunControl,
    state: Arc<watch::Sender<TransferSnapshot>>,
    stages: Arc<dyn TransferStages>,
    finalizer: Arc<dyn Finalizer>,
    input: WorkflowInput,
    stage: Stage,
    /// Working copy, published on every commit
    balances: Balances,
}

impl TransferRun {
    /// Drive the run to its terminal snapshot.
    ///
    /// Whatever the business stages do, including panicking, `Cleanup` is
    /// entered exactly once before the outcome is published.
    async fn execute(mut self) -> Result<Outcome, TransferError> {
        let business = AssertUnwindSafe(self.run_stages()).catch_unwind().await;

        let outcome = match business {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_cancelled() => {
                info!(stage = %self.stage, "Transfer cancelled");
                Outcome::Cancelled
            }
            Ok(Err(e)) if e.is_fault() => {
                error!(
                    stage = %self.stage,
                    code = e.code(),
                    error = %e,
                    "Transfer stage failed, restoring balances"
                );
                self.recover_from_fault()
            }
            Ok(Err(e)) => {
                debug_assert!(e.is_business(), "unclassified transfer error: {e:?}");
                info!(stage = %self.stage, code = e.code(), reason = %e, "Transfer rejected");
                Outcome::rejected(&e)
            }
            Err(payload) => {
                error!(
                    stage = %self.stage,
                    panic = %panic_message(payload.as_ref()),
                    "Transfer stage panicked, restoring balances"
                );
                self.recover_from_fault()
            }
        };

        self.finalize().await;
        self.publish_terminal(&outcome);
        self.control.mark_done();

        outcome.into_result()
    }

    async fn run_stages(&mut self) -> Result<Outcome, TransferError> {
        let amount = parse_transfer_amount(self.input.amount())?;

        self.enter(Stage::CheckingPreconditions)?;
        let has_funds = self
            .stages
            .check_funds(self.balances.source, amount)
            .await
            .map_err(|e| e.into_transfer_error(self.stage.as_str()))?;
        if !has_funds {
            return Err(TransferError::InsufficientFunds);
        }

        self.checkpoint()?;
        self.enter(Stage::Debiting)?;
        let source = self
            .stages
            .debit(self.balances.source, amount)
            .await
            .map_err(|e| e.into_transfer_error(self.stage.as_str()))?;
        self.commit(|b| b.source = source);

        self.checkpoint()?;
        self.enter(Stage::Crediting)?;
        let destination = self
            .stages
            .credit(self.balances.destination, amount)
            .await
            .map_err(|e| e.into_transfer_error(self.stage.as_str()))?;
        self.commit(|b| b.destination = destination);

        // Credit already landed; a cancel that arrived during it still wins.
        self.checkpoint()?;
        Ok(Outcome::success())
    }

    fn checkpoint(&self) -> Result<(), TransferError> {
        if self.control.is_cancelled() {
            debug!(stage = %self.stage, "Cancellation observed at checkpoint");
            return Err(TransferError::Cancelled);
        }
        Ok(())
    }

    fn enter(&mut self, next: Stage) -> Result<(), TransferError> {
        if !self.stage.can_transition_to(next) {
            return Err(TransferError::InvalidStateTransition(format!(
                "{} -> {}",
                self.stage, next
            )));
        }
        debug!(from = %self.stage, to = %next, "Entering stage");
        self.stage = next;
        self.publish(|snap| snap.stage = Some(next));
        Ok(())
    }

    fn commit(&mut self, apply: impl FnOnce(&mut Balances)) {
        debug_assert!(self.stage.is_irreversible(), "commit outside a balance stage");
        apply(&mut self.balances);
        let balances = self.balances;
        info!(
            stage = %self.stage,
            irreversible = self.stage.is_irreversible(),
            source = %balances.source,
            destination = %balances.destination,
            "Balance committed"
        );
        self.publish(move |snap| snap.balances = balances);
    }

    /// Restore balances after a fault. A cancel requested before the fault
    /// still wins, so the run keeps propagating cancellation.
    fn recover_from_fault(&mut self) -> Outcome {
        self.rollback();
        if self.control.is_cancelled() {
            info!(stage = %self.stage, "Fault during a cancelled transfer, reporting cancellation");
            Outcome::Cancelled
        } else {
            Outcome::fault()
        }
    }

    fn rollback(&mut self) {
        let restored = self.input.balances();
        if self.balances != restored {
            warn!(
                source = %restored.source,
                destination = %restored.destination,
                "Rolling back committed balances"
            );
        }
        self.balances = restored;
        self.publish(move |snap| snap.balances = restored);
    }

    /// Non-cancellable region: the finalizer never sees the run's token.
    async fn finalize(&mut self) {
        debug!(
            from = %self.stage,
            interrupted = self.stage.is_business(),
            "Entering cleanup"
        );
        self.stage = Stage::Cleanup;
        self.publish(|snap| snap.stage = Some(Stage::Cleanup));

        if let Err(payload) = AssertUnwindSafe(self.finalizer.cleanup())
            .catch_unwind()
            .await
        {
            error!(panic = %panic_message(payload.as_ref()), "Finalizer panicked");
        }
    }

    fn publish_terminal(&self, outcome: &Outcome) {
        let published = if self.control.is_reset() {
            None
        } else {
            Some(outcome.clone())
        };
        info!(
            outcome = outcome.message(),
            cancelled = outcome.is_cancelled(),
            source = %self.balances.source,
            destination = %self.balances.destination,
            "Transfer finished"
        );
        self.publish(move |snap| {
            snap.stage = None;
            snap.is_running = false;
            snap.outcome = published;
        });
    }

    /// Replace the snapshot, unless another run has taken over publication
    fn publish(&self, update: impl FnOnce(&mut TransferSnapshot)) {
        let id = self.control.id();
        self.state.send_if_modified(|snap| {
            if snap.run_id != Some(id) {
                return false;
            }
            update(snap);
            true
        });
    }
}

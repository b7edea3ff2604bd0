//! Cancellable Staged Transfer
//!
//! Moves an amount from a source balance to a destination balance through a
//! fixed sequence of async stages, with cooperative cancellation and a
//! finalizer that always runs.
//!
//! # Stage Machine
//!
//! ```text
//! IDLE → CHECKING_PRECONDITIONS → DEBITING → CREDITING ─┐
//!   │            │                   │                   │
//!   └────────────┴───────────────────┴──────→ CLEANUP ←──┘ → terminal
//! ```
//!
//! # Invariants
//!
//! 1. **Checkpoint-Before-Write**: cancellation is polled before `Debiting`,
//!    before `Crediting` and once after it. An in-flight stage is never interrupted.
//! 2. **Always Finalize**: `Cleanup` runs exactly once per started run, on every
//!    exit path, and never observes the cancellation token.
//! 3. **Outcome After Cleanup**: the single `Outcome` is published only after
//!    the finalizer returns.
//! 4. **Cancellation Propagates**: faults are absorbed into an `Outcome`;
//!    cancellation surfaces as `Err(TransferError::Cancelled)` from the handle.

pub mod adapters;
pub mod coordinator;
pub mod error;
pub mod handle;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use adapters::{Finalizer, SimulatedFinalizer, SimulatedStages, StageLatency, TransferStages};
pub use coordinator::TransferCoordinator;
pub use error::{StageError, TransferError};
pub use handle::TransferHandle;
pub use state::Stage;
pub use types::{Balances, Outcome, TransferId, TransferSnapshot, WorkflowInput};

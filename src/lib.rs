//! Staged Transfer - cancellable multi-stage workflow
//!
//! A reusable "cancellable staged task with guaranteed finalizer", shown on a
//! savings → checking money transfer.
//!
//! # Modules
//!
//! - [`transfer`] - Stage machine, coordinator, handles and stage adapters
//! - [`money`] - Amount parsing and formatting
//! - [`config`] - YAML application config
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod money;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{AppConfig, TransferConfig};
pub use transfer::{
    Balances, Finalizer, Outcome, SimulatedFinalizer, SimulatedStages, Stage, StageError,
    StageLatency, TransferCoordinator, TransferError, TransferHandle, TransferId, TransferSnapshot,
    TransferStages, WorkflowInput,
};

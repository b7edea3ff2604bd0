//! Stage Adapters
//!
//! Pluggable stage functions and the finalizer used by the coordinator.
//! A stage never mutates balances itself; it reports the value to commit and
//! the coordinator applies it once the stage's await has returned.

pub mod simulated;

pub use simulated::{SimulatedFinalizer, SimulatedStages, StageLatency};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::StageError;

/// Business stage functions: `(current value, amount) -> async result`
#[async_trait]
pub trait TransferStages: Send + Sync {
    /// Get adapter name for logging
    fn name(&self) -> &'static str;

    /// Precondition check, e.g. sufficient funds on the source
    async fn check_funds(&self, source: Decimal, amount: Decimal) -> Result<bool, StageError>;

    /// Debit the source. Returns the new source balance.
    async fn debit(&self, source: Decimal, amount: Decimal) -> Result<Decimal, StageError>;

    /// Credit the destination. Returns the new destination balance.
    async fn credit(&self, destination: Decimal, amount: Decimal) -> Result<Decimal, StageError>;
}

/// Finalizer run exactly once per started run.
///
/// Receives no cancellation token and must not need one.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn cleanup(&self);
}


#[cfg(test)]
pub use mock::{MockFailure, MockFinalizer, MockStages, MockStep};

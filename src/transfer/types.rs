//! Transfer Core Types
//!
//! Type definitions shared by the coordinator, its handles and observers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TransferError;
use super::state::Stage;

/// Run ID type - ULID-based unique identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Source (savings) and destination (checking) balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub source: Decimal,
    pub destination: Decimal,
}

impl Balances {
    pub fn new(source: Decimal, destination: Decimal) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Immutable snapshot taken when a run starts
///
/// The amount is kept as the raw text the caller entered; it is validated
/// inside the run so that a bad amount still goes through the finalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInput {
    balances: Balances,
    amount: String,
}

impl WorkflowInput {
    pub fn new(balances: Balances, amount: impl Into<String>) -> Self {
        Self {
            balances,
            amount: amount.into(),
        }
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum Outcome {
    Success(String),
    BusinessFailure(String),
    Cancelled,
}

impl Outcome {
    pub const COMPLETE: &'static str = "Transfer complete!";
    pub const FAULT: &'static str = "Transfer failed, balances restored";

    pub fn success() -> Self {
        Outcome::Success(Self::COMPLETE.to_string())
    }

    /// Business failure from a recovered input or precondition error
    pub fn rejected(err: &TransferError) -> Self {
        Outcome::BusinessFailure(err.to_string())
    }

    /// Generic failure used after an unexpected fault was rolled back
    pub fn fault() -> Self {
        Outcome::BusinessFailure(Self::FAULT.to_string())
    }

    /// The single human-readable line shown to the user
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success(msg) | Outcome::BusinessFailure(msg) => msg,
            Outcome::Cancelled => "Transfer cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Cancellation is the only outcome that keeps propagating as an error
    pub fn into_result(self) -> Result<Outcome, TransferError> {
        match self {
            Outcome::Cancelled => Err(TransferError::Cancelled),
            other => Ok(other),
        }
    }
}

/// Observable read model published by the coordinator
///
/// Only ever replaced at stage-entry and stage-exit boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSnapshot {
    /// Run that currently owns publication rights
    pub run_id: Option<TransferId>,
    pub stage: Option<Stage>,
    pub is_running: bool,
    pub outcome: Option<Outcome>,
    pub balances: Balances,
}

impl TransferSnapshot {
    pub fn idle(balances: Balances) -> Self {
        Self {
            run_id: None,
            stage: None,
            is_running: false,
            outcome: None,
            balances,
        }
    }

    pub fn outcome_message(&self) -> Option<&str> {
        self.outcome.as_ref().map(Outcome::message)
    }
}

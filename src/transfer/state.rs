//! Transfer Stage Definitions
//!
//! One run walks the stages strictly forward. Any stage may jump straight to
//! `Cleanup`, which is the only way out of a run.

use std::fmt;

use serde::Serialize;

/// Transfer stages
///
/// Exactly one stage is active at a time while a run is in flight.
/// The terminal state is not a stage: once `Cleanup` returns, the published
/// stage becomes `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Stage {
    /// Run accepted, input being validated
    Idle = 0,

    /// Async precondition check (sufficient funds)
    CheckingPreconditions = 10,

    /// Source debit in flight
    Debiting = 20,

    /// Destination credit in flight
    Crediting = 30,

    /// Finalizer - never cancelled, always entered exactly once
    Cleanup = 40,
}

impl Stage {
    /// Business stages are the ones a checkpoint may skip
    #[inline]
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Stage::CheckingPreconditions | Stage::Debiting | Stage::Crediting
        )
    }

    /// Stages whose completion mutates a balance
    #[inline]
    pub fn is_irreversible(&self) -> bool {
        matches!(self, Stage::Debiting | Stage::Crediting)
    }

    /// Legal transition check: strictly forward, or directly to `Cleanup`.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        match (self, next) {
            (Stage::Cleanup, _) => false,
            (_, Stage::Cleanup) => true,
            (current, next) => next > *current,
        }
    }

    /// Get human-readable stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::CheckingPreconditions => "CHECKING_PRECONDITIONS",
            Stage::Debiting => "DEBITING",
            Stage::Crediting => "CREDITING",
            Stage::Cleanup => "CLEANUP",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

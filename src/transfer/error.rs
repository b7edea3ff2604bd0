//! Transfer Error Types
//!
//! `TransferError` is the run-level taxonomy. Its `Display` text doubles as the
//! user-facing outcome message for business failures.
//! `StageError` is what a single stage function may return.

use thiserror::Error;

/// Transfer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Input Errors ===
    #[error("Invalid Amount")]
    InvalidAmount,

    #[error("Enter amount greater than 0")]
    AmountNotPositive,

    // === Precondition Errors ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    // === Control Flow ===
    /// Cooperative cancellation. Never absorbed into a business outcome.
    #[error("Transfer cancelled")]
    Cancelled,

    // === Unexpected Faults ===
    #[error("Stage fault during {stage}: {reason}")]
    StageFault { stage: &'static str, reason: String },

    #[error("Invalid stage transition: {0}")]
    InvalidStateTransition(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl TransferError {
    /// Stable error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::AmountNotPositive => "AMOUNT_NOT_POSITIVE",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::Cancelled => "CANCELLED",
            TransferError::StageFault { .. } => "STAGE_FAULT",
            TransferError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            TransferError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Input and precondition failures, recovered locally as a business outcome
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidAmount
                | TransferError::AmountNotPositive
                | TransferError::InsufficientFunds
        )
    }

    /// Faults trigger a rollback of every balance committed by the run
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            TransferError::StageFault { .. }
                | TransferError::InvalidStateTransition(_)
                | TransferError::SystemError(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled)
    }
}

/// Error returned by a stage function
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The stage gave up because its own work was cancelled.
    /// Nothing is committed; the run ends as Cancelled.
    #[error("stage cancelled")]
    Cancelled,

    /// Anything else that went wrong inside the stage
    #[error("{0}")]
    Fault(String),
}

impl StageError {
    /// Lift a stage error into the run-level taxonomy
    pub fn into_transfer_error(self, stage: &'static str) -> TransferError {
        match self {
            StageError::Cancelled => TransferError::Cancelled,
            StageError::Fault(reason) => TransferError::StageFault { stage, reason },
        }
    }
}

impl From<tokio::task::JoinError> for TransferError {
    fn from(e: tokio::task::JoinError) -> Self {
        TransferError::SystemError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::InvalidAmount.code(), "INVALID_AMOUNT");
        assert_eq!(TransferError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(TransferError::Cancelled.code(), "CANCELLED");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(TransferError::InvalidAmount.to_string(), "Invalid Amount");
        assert_eq!(
            TransferError::AmountNotPositive.to_string(),
            "Enter amount greater than 0"
        );
        assert_eq!(
            TransferError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
    }

    #[test]
    fn test_classification() {
        assert!(TransferError::InsufficientFunds.is_business());
        assert!(!TransferError::InsufficientFunds.is_fault());

        assert!(TransferError::Cancelled.is_cancelled());
        assert!(!TransferError::Cancelled.is_business());
        assert!(!TransferError::Cancelled.is_fault());

        let fault = TransferError::StageFault {
            stage: "DEBITING",
            reason: "ledger offline".into(),
        };
        assert!(fault.is_fault());
        assert!(!fault.is_business());
    }

    #[test]
    fn test_stage_error_lifting() {
        assert_eq!(
            StageError::Cancelled.into_transfer_error("CREDITING"),
            TransferError::Cancelled
        );
        assert_eq!(
            StageError::Fault("boom".into()).into_transfer_error("CREDITING"),
            TransferError::StageFault {
                stage: "CREDITING",
                reason: "boom".into()
            }
        );
    }
}

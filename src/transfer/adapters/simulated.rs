//! Simulated Stages
//!
//! In-memory stage functions with injected latency. Used by the demo binary
//! and as the default wiring when no real ledger is available.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{Finalizer, TransferStages};
use crate::config::TransferConfig;
use crate::transfer::error::StageError;

/// Per-stage latency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLatency {
    pub check_funds: Duration,
    pub debit: Duration,
    pub credit: Duration,
    pub cleanup: Duration,
}

impl StageLatency {
    /// No latency at all, for tests
    pub const ZERO: StageLatency = StageLatency {
        check_funds: Duration::ZERO,
        debit: Duration::ZERO,
        credit: Duration::ZERO,
        cleanup: Duration::ZERO,
    };
}

impl Default for StageLatency {
    fn default() -> Self {
        Self {
            check_funds: Duration::from_millis(2000),
            debit: Duration::from_millis(3000),
            credit: Duration::from_millis(3000),
            cleanup: Duration::from_millis(2000),
        }
    }
}

impl From<&TransferConfig> for StageLatency {
    fn from(config: &TransferConfig) -> Self {
        Self {
            check_funds: Duration::from_millis(config.check_funds_ms),
            debit: Duration::from_millis(config.debit_ms),
            credit: Duration::from_millis(config.credit_ms),
            cleanup: Duration::from_millis(config.cleanup_ms),
        }
    }
}

/// Business stages backed by plain arithmetic and `tokio::time::sleep`
#[derive(Debug, Clone, Default)]
pub struct SimulatedStages {
    latency: StageLatency,
}

impl SimulatedStages {
    pub fn new(latency: StageLatency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl TransferStages for SimulatedStages {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn check_funds(&self, source: Decimal, amount: Decimal) -> Result<bool, StageError> {
        debug!(source = %source, amount = %amount, "Checking funds");
        tokio::time::sleep(self.latency.check_funds).await;
        Ok(amount <= source)
    }

    async fn debit(&self, source: Decimal, amount: Decimal) -> Result<Decimal, StageError> {
        debug!(source = %source, amount = %amount, "Debiting source");
        tokio::time::sleep(self.latency.debit).await;
        source
            .checked_sub(amount)
            .ok_or_else(|| StageError::Fault("debit overflow".into()))
    }

    async fn credit(&self, destination: Decimal, amount: Decimal) -> Result<Decimal, StageError> {
        debug!(destination = %destination, amount = %amount, "Crediting destination");
        tokio::time::sleep(self.latency.credit).await;
        destination
            .checked_add(amount)
            .ok_or_else(|| StageError::Fault("credit overflow".into()))
    }
}

/// Finalizer that releases task-scoped resources after a bounded delay
#[derive(Debug, Clone, Default)]
pub struct SimulatedFinalizer {
    latency: Duration,
}

impl SimulatedFinalizer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Finalizer for SimulatedFinalizer {
    async fn cleanup(&self) {
        debug!(latency_ms = self.latency.as_millis() as u64, "Releasing transfer resources");
        tokio::time::sleep(self.latency).await;
        info!("Transfer resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_from_config() {
        let config = TransferConfig {
            check_funds_ms: 1,
            debit_ms: 2,
            credit_ms: 3,
            cleanup_ms: 4,
            ..TransferConfig::default()
        };
        let latency = StageLatency::from(&config);
        assert_eq!(latency.debit, Duration::from_millis(2));
        assert_eq!(latency.cleanup, Duration::from_millis(4));
    }

    #[test]
    fn test_default_latency() {
        let latency = StageLatency::default();
        assert_eq!(latency.check_funds, Duration::from_secs(2));
        assert_eq!(latency.credit, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_simulated_stages_arithmetic() {
        let stages = SimulatedStages::new(StageLatency::ZERO);

        assert!(stages.check_funds(Decimal::from(1000), Decimal::from(1000)).await.unwrap());
        assert!(!stages.check_funds(Decimal::from(100), Decimal::from(200)).await.unwrap());
        assert_eq!(
            stages.debit(Decimal::from(1000), Decimal::from(200)).await.unwrap(),
            Decimal::from(800)
        );
        assert_eq!(
            stages.credit(Decimal::from(500), Decimal::from(200)).await.unwrap(),
            Decimal::from(700)
        );
    }
}

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::transfer::Balances;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Transfer workflow settings
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Initial balances and simulated stage latencies
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransferConfig {
    pub savings: Decimal,
    pub checking: Decimal,
    pub check_funds_ms: u64,
    pub debit_ms: u64,
    pub credit_ms: u64,
    pub cleanup_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            savings: Decimal::from(1000),
            checking: Decimal::from(500),
            check_funds_ms: 2000,
            debit_ms: 3000,
            credit_ms: 3000,
            cleanup_ms: 2000,
        }
    }
}

impl TransferConfig {
    pub fn initial_balances(&self) -> Balances {
        Balances::new(self.savings, self.checking)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
log_level: info
log_dir: ./logs
log_file: transfer.log
use_json: false
rotation: never
"#;

    #[test]
    fn test_transfer_section_defaults() {
        let config = AppConfig::from_yaml_str(BASE).unwrap();
        assert_eq!(config.transfer, TransferConfig::default());
        assert_eq!(
            config.transfer.initial_balances(),
            Balances::new(Decimal::from(1000), Decimal::from(500))
        );
    }

    #[test]
    fn test_transfer_section_partial_override() {
        let yaml = format!("{BASE}transfer:\n  savings: 250\n  debit_ms: 10\n");
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.transfer.savings, Decimal::from(250));
        assert_eq!(config.transfer.debit_ms, 10);
        assert_eq!(config.transfer.checking, Decimal::from(500));
        assert_eq!(config.transfer.cleanup_ms, 2000);
    }

    #[test]
    fn test_load_checked_in_configs() {
        let dev = AppConfig::load("dev").unwrap();
        assert_eq!(dev.transfer, TransferConfig::default());

        let test = AppConfig::load("test").unwrap();
        assert!(test.use_json);
        assert_eq!(test.transfer.debit_ms, 10);
        assert!(AppConfig::load("missing").is_err());
    }

    #[test]
    fn test_missing_required_field_is_error() {
        assert!(AppConfig::from_yaml_str("log_level: info\n").is_err());
    }
}

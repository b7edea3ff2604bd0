//! Money Parsing Module
//!
//! Conversion between the text a user typed and the `Decimal` the engine works
//! with. All amount validation goes through this module.
//!
//! ## Usage
//! ```rust
//! use staged_transfer::money::{format_amount, parse_transfer_amount};
//!
//! let amount = parse_transfer_amount(" 200.50 ").unwrap();
//! assert_eq!(format_amount(amount, 2), "200.50");
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::transfer::TransferError;

// ============================================================================
// Error Types
// ============================================================================

/// Money parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must be positive")]
    NotPositive,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::NotPositive => TransferError::AmountNotPositive,
            MoneyError::InvalidFormat(_) => TransferError::InvalidAmount,
        }
    }
}

// ============================================================================
// Parse: Client → Internal (String → Decimal)
// ============================================================================

/// Convert a user-entered transfer amount to a positive `Decimal`
///
/// # Errors
/// * `InvalidFormat` - empty or not a decimal number
/// * `NotPositive` - zero or negative
pub fn parse_transfer_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    let amount = Decimal::from_str(amount_str)
        .map_err(|e| MoneyError::InvalidFormat(format!("{amount_str}: {e}")))?;

    if amount.is_zero() || amount.is_sign_negative() {
        return Err(MoneyError::NotPositive);
    }

    Ok(amount.normalize())
}

// ============================================================================
// Format: Internal → Client (Decimal → String)
// ============================================================================

/// Render a balance with a fixed number of decimals
pub fn format_amount(value: Decimal, display_decimals: u32) -> String {
    format!("{:.prec$}", value, prec = display_decimals as usize)
}

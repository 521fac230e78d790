// 7.0 config.rs: all simulator settings in one place. starting balance, fees, margin mode.
// 7.1 presets cover the common setups. validate() before handing a config to the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::MarginMode;

// Taker fee charged on both the opening and the closing fill (0.04%)
pub const DEFAULT_FEE_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 4);

// Decimal places used by format_quantity
pub const DEFAULT_QUANTITY_PRECISION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    // Starting wallet and available balance, in quote currency
    pub initial_balance: Decimal,
    // Fraction of notional charged per fill
    pub fee_rate: Decimal,
    // Default margin mode stamped on new positions
    pub margin_mode: MarginMode,
    // Decimal places for rendered quantities
    pub quantity_precision: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::new(10_000, 0),
            fee_rate: DEFAULT_FEE_RATE,
            margin_mode: MarginMode::Cross,
            quantity_precision: DEFAULT_QUANTITY_PRECISION,
        }
    }
}

impl SimulatorConfig {
    pub fn new(initial_balance: Decimal, is_cross_margin: bool) -> Self {
        Self {
            initial_balance,
            margin_mode: MarginMode::from_cross_flag(is_cross_margin),
            ..Self::default()
        }
    }

    // No fees at all, handy for isolating pnl in tests and demos
    pub fn zero_fee() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            ..Self::default()
        }
    }

    pub fn with_initial_balance(mut self, balance: Decimal) -> Self {
        self.initial_balance = balance;
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    pub fn with_margin_mode(mut self, mode: MarginMode) -> Self {
        self.margin_mode = mode;
        self
    }

    pub fn with_quantity_precision(mut self, precision: u32) -> Self {
        self.quantity_precision = precision;
        self
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidBalance {
                reason: "initial balance cannot be negative".to_string(),
            });
        }

        // a fee of 100% or more would eat the whole notional on every fill
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidFees {
                reason: "fee rate must be in [0, 1)".to_string(),
            });
        }

        if self.quantity_precision > 28 {
            return Err(ConfigError::InvalidPrecision {
                reason: "quantity precision above 28 decimal places".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid balance: {reason}")]
    InvalidBalance { reason: String },

    #[error("invalid fees: {reason}")]
    InvalidFees { reason: String },

    #[error("invalid precision: {reason}")]
    InvalidPrecision { reason: String },
}

// 8.0 ledger/core.rs: the simulated trader. one account behind one mutex, plus the oracle.

use super::results::LedgerError;
use crate::account::Account;
use crate::config::{ConfigError, SimulatorConfig};
use crate::position::Position;
use crate::price_feed::{resolve_price, PriceOracle};
use crate::types::{MarginMode, PositionKey, Price, Quote, Side};
use parking_lot::Mutex;
use rust_decimal::{Decimal, RoundingStrategy};

/** 8.1: paper-trading exchange adapter. all account state lives here */
#[derive(Debug)]
pub struct SimulatedTrader<O> {
    pub(super) account: Mutex<Account>,
    pub(super) oracle: O,
    pub(super) quantity_precision: u32,
}

impl<O: PriceOracle> SimulatedTrader<O> {
    /// Starts with `initial_balance` in both wallet and available balance and
    /// the default fee rate.
    pub fn new(oracle: O, initial_balance: Decimal, is_cross_margin: bool) -> Self {
        let config = SimulatorConfig::new(initial_balance, is_cross_margin);
        Self::build(oracle, &config)
    }

    pub fn from_config(oracle: O, config: &SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(oracle, config))
    }

    fn build(oracle: O, config: &SimulatorConfig) -> Self {
        tracing::debug!(
            initial_balance = %config.initial_balance,
            fee_rate = %config.fee_rate,
            margin_mode = %config.margin_mode,
            "simulated trader created"
        );
        Self {
            account: Mutex::new(Account::from_config(config)),
            oracle,
            quantity_precision: config.quantity_precision,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Current price from the oracle, with non-positive quotes rejected.
    pub fn market_price(&self, symbol: &str) -> Result<Decimal, LedgerError> {
        Ok(self.price(symbol)?.value())
    }

    pub(super) fn price(&self, symbol: &str) -> Result<Price, LedgerError> {
        resolve_price(&self.oracle, symbol).map_err(LedgerError::from)
    }

    /// Fixed precision regardless of symbol.
    pub fn format_quantity(&self, _symbol: &str, quantity: Decimal) -> String {
        let precision = self.quantity_precision as usize;
        let rounded = quantity
            .round_dp_with_strategy(self.quantity_precision, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.precision$}")
    }

    pub fn fee_rate(&self) -> Decimal {
        self.account.lock().fee_rate
    }

    pub fn margin_mode(&self) -> MarginMode {
        self.account.lock().margin_mode
    }

    pub fn order_count(&self) -> u64 {
        self.account.lock().order_count()
    }

    pub fn realized_pnl(&self) -> Quote {
        self.account.lock().realized_pnl
    }

    pub fn fees_paid(&self) -> Quote {
        self.account.lock().fees_paid
    }

    /// Copy of the raw position record, if one is open.
    pub fn position(&self, symbol: &str, side: Side) -> Option<Position> {
        self.account
            .lock()
            .get_position(&PositionKey::new(symbol, side))
            .cloned()
    }

    // 8.2: positions, wallet, available, copied under the lock and nothing else
    pub(super) fn snapshot(&self) -> (Vec<Position>, Quote, Quote) {
        let account = self.account.lock();
        let positions = account.positions.values().cloned().collect();
        (positions, account.wallet_balance, account.available_balance)
    }
}

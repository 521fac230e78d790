//! Position settings and advisory stop orders.
//!
//! Leverage, margin mode and stop-loss/take-profit are annotations on open
//! positions. None of them move funds or recompute reserved margin. Stop
//! prices are recorded for callers to read back; the simulator never
//! triggers them.

use super::core::SimulatedTrader;
use super::results::LedgerError;
use crate::account::Account;
use crate::price_feed::PriceOracle;
use crate::types::{normalize_side, Leverage, MarginMode, PositionKey, Timestamp};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopKind {
    StopLoss,
    TakeProfit,
}

impl<O: PriceOracle> SimulatedTrader<O> {
    /// Changes the leverage shown for both sides of `symbol`. Margin already
    /// reserved stays as it was; only the displayed liquidation price and
    /// maintenance margin follow.
    pub fn set_leverage(&self, symbol: &str, leverage: i64) -> Result<(), LedgerError> {
        let leverage = Leverage::new(leverage).ok_or(LedgerError::InvalidLeverage)?;

        let mut account = self.account.lock();
        let now = Timestamp::now();
        for position in account.positions_for_symbol_mut(symbol) {
            position.leverage = leverage;
            position.updated_at = now;
        }

        tracing::debug!(symbol, %leverage, "leverage set");
        Ok(())
    }

    /// Sets the account-wide default and retags any open positions on `symbol`.
    pub fn set_margin_mode(&self, symbol: &str, is_cross_margin: bool) -> Result<(), LedgerError> {
        let mode = MarginMode::from_cross_flag(is_cross_margin);

        let mut account = self.account.lock();
        account.margin_mode = mode;
        let now = Timestamp::now();
        for position in account.positions_for_symbol_mut(symbol) {
            position.margin_mode = mode;
            position.updated_at = now;
        }

        tracing::debug!(symbol, margin_mode = %mode, "margin mode set");
        Ok(())
    }

    /// `quantity` is accepted for parity with exchange order APIs and ignored:
    /// the trigger always covers the whole position.
    pub fn set_stop_loss(
        &self,
        symbol: &str,
        position_side: &str,
        _quantity: Decimal,
        stop_price: Decimal,
    ) -> Result<(), LedgerError> {
        self.set_trigger(symbol, position_side, stop_price, StopKind::StopLoss);
        Ok(())
    }

    pub fn set_take_profit(
        &self,
        symbol: &str,
        position_side: &str,
        _quantity: Decimal,
        take_profit_price: Decimal,
    ) -> Result<(), LedgerError> {
        self.set_trigger(symbol, position_side, take_profit_price, StopKind::TakeProfit);
        Ok(())
    }

    pub fn cancel_stop_loss_orders(&self, symbol: &str) -> Result<(), LedgerError> {
        clear_triggers(&mut self.account.lock(), symbol, &[StopKind::StopLoss]);
        Ok(())
    }

    pub fn cancel_take_profit_orders(&self, symbol: &str) -> Result<(), LedgerError> {
        clear_triggers(&mut self.account.lock(), symbol, &[StopKind::TakeProfit]);
        Ok(())
    }

    pub fn cancel_stop_orders(&self, symbol: &str) -> Result<(), LedgerError> {
        clear_triggers(
            &mut self.account.lock(),
            symbol,
            &[StopKind::StopLoss, StopKind::TakeProfit],
        );
        Ok(())
    }

    // stop orders are the only resting orders the simulator has
    pub fn cancel_all_orders(&self, symbol: &str) -> Result<(), LedgerError> {
        self.cancel_stop_orders(symbol)
    }

    fn set_trigger(&self, symbol: &str, position_side: &str, price: Decimal, kind: StopKind) {
        let side = match normalize_side(position_side) {
            Ok(side) => side,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "trigger ignored");
                return;
            }
        };

        let mut account = self.account.lock();
        let Some(position) = account.get_position_mut(&PositionKey::new(symbol, side)) else {
            return;
        };
        match kind {
            StopKind::StopLoss => position.stop_loss = price,
            StopKind::TakeProfit => position.take_profit = price,
        }
        position.updated_at = Timestamp::now();

        tracing::debug!(symbol, side = %side, %price, kind = ?kind, "trigger recorded");
    }
}

fn clear_triggers(account: &mut Account, symbol: &str, kinds: &[StopKind]) {
    let now = Timestamp::now();
    for position in account.positions_for_symbol_mut(symbol) {
        for kind in kinds {
            match kind {
                StopKind::StopLoss => position.stop_loss = Decimal::ZERO,
                StopKind::TakeProfit => position.take_profit = Decimal::ZERO,
            }
        }
        position.updated_at = now;
    }
}

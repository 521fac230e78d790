//! Opening and closing positions.
//!
//! Both operations hold the account lock for their whole body, price lookup
//! included, and validate everything before touching balances. A failed call
//! leaves the account exactly as it was.

use super::core::SimulatedTrader;
use super::results::{FillAck, FillStatus, LedgerError};
use crate::margin::{fill_fee, open_cost};
use crate::position::{reduce_position, resolve_close_quantity, Position};
use crate::price_feed::PriceOracle;
use crate::types::{Leverage, PositionKey, Side, Timestamp};
use rust_decimal::Decimal;

impl<O: PriceOracle> SimulatedTrader<O> {
    pub fn open_long(&self, symbol: &str, quantity: Decimal, leverage: i64) -> Result<FillAck, LedgerError> {
        self.open(symbol, quantity, leverage, Side::Long)
    }

    pub fn open_short(&self, symbol: &str, quantity: Decimal, leverage: i64) -> Result<FillAck, LedgerError> {
        self.open(symbol, quantity, leverage, Side::Short)
    }

    pub fn close_long(&self, symbol: &str, quantity: Decimal) -> Result<FillAck, LedgerError> {
        self.close(symbol, quantity, Side::Long)
    }

    pub fn close_short(&self, symbol: &str, quantity: Decimal) -> Result<FillAck, LedgerError> {
        self.close(symbol, quantity, Side::Short)
    }

    /// Opens a new position at the current price. A non-positive leverage is
    /// treated as 1x. There is no averaging in: a second open on the same
    /// symbol and side is rejected.
    pub fn open(
        &self,
        symbol: &str,
        quantity: Decimal,
        leverage: i64,
        side: Side,
    ) -> Result<FillAck, LedgerError> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity);
        }
        let leverage = Leverage::or_one(leverage);

        let mut account = self.account.lock();

        let price = self.price(symbol).map_err(|e| {
            tracing::warn!(symbol, side = %side, error = %e, "open rejected");
            e
        })?;

        let cost = open_cost(price, quantity, leverage, account.fee_rate).ok_or_else(|| {
            tracing::warn!(symbol, side = %side, %quantity, %price, "open rejected: size out of range");
            LedgerError::Overflow {
                symbol: symbol.to_string(),
            }
        })?;

        let key = PositionKey::new(symbol, side);
        if account.has_position(&key) {
            tracing::warn!(symbol, side = %side, "open rejected: position already open");
            return Err(LedgerError::PositionExists {
                symbol: symbol.to_string(),
                side,
            });
        }

        account
            .reserve_margin(cost.margin_required, cost.fee)
            .map_err(|e| {
                tracing::warn!(symbol, side = %side, error = %e, "open rejected");
                LedgerError::from(e)
            })?;

        let margin_mode = account.margin_mode;
        account.set_position(Position::new(
            symbol,
            side,
            quantity,
            price,
            leverage,
            cost.margin_required,
            margin_mode,
            Timestamp::now(),
        ));

        let order_id = account.next_order_id();

        tracing::debug!(
            order_id = %order_id,
            symbol,
            side = %side,
            %quantity,
            %price,
            %leverage,
            margin = %cost.margin_required,
            fee = %cost.fee,
            "position opened"
        );

        Ok(FillAck {
            order_id,
            symbol: symbol.to_string(),
            status: FillStatus::Filled,
            avg_price: price.value(),
        })
    }

    /// Closes `quantity` of a position at the current price. Anything outside
    /// `(0, position quantity)` closes the whole position.
    pub fn close(&self, symbol: &str, quantity: Decimal, side: Side) -> Result<FillAck, LedgerError> {
        let mut account = self.account.lock();

        let key = PositionKey::new(symbol, side);
        let position = account
            .get_position(&key)
            .cloned()
            .ok_or_else(|| LedgerError::PositionNotFound {
                symbol: symbol.to_string(),
                side,
            })?;

        let close_quantity = resolve_close_quantity(&position, quantity);
        if close_quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidCloseQuantity);
        }

        let price = self.price(symbol).map_err(|e| {
            tracing::warn!(symbol, side = %side, error = %e, "close rejected");
            e
        })?;

        let overflow = || {
            tracing::warn!(symbol, side = %side, quantity = %close_quantity, %price, "close rejected: size out of range");
            LedgerError::Overflow {
                symbol: symbol.to_string(),
            }
        };
        let fee = fill_fee(price, close_quantity, account.fee_rate).ok_or_else(overflow)?;
        let update =
            reduce_position(&position, close_quantity, price, Timestamp::now()).ok_or_else(overflow)?;

        account
            .settle_close(update.margin_released, update.realized_pnl, fee)
            .map_err(|e| {
                tracing::warn!(symbol, side = %side, error = %e, "close rejected");
                LedgerError::from(e)
            })?;
        match update.new_position {
            Some(remaining) => account.set_position(remaining),
            None => {
                account.remove_position(&key);
            }
        }

        let order_id = account.next_order_id();

        tracing::debug!(
            order_id = %order_id,
            symbol,
            side = %side,
            quantity = %close_quantity,
            %price,
            pnl = %update.realized_pnl,
            margin_released = %update.margin_released,
            %fee,
            "position closed"
        );

        Ok(FillAck {
            order_id,
            symbol: symbol.to_string(),
            status: FillStatus::Filled,
            avg_price: price.value(),
        })
    }
}

//! Account state for one simulated trader.
//!
//! The wallet balance is total equity: it moves with fees and realized pnl.
//! The available balance is the part not locked up as position margin, and is
//! the only figure checked before new exposure is opened. The two are kept
//! independently, so nothing here forces `available <= wallet`.
//!
//! This type does no locking of its own. The ledger owns it behind a mutex.

use crate::config::SimulatorConfig;
use crate::position::Position;
use crate::types::{MarginMode, OrderId, PositionKey, Quote};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Account {
    pub wallet_balance: Quote,
    pub available_balance: Quote,
    pub fee_rate: Decimal,
    pub margin_mode: MarginMode,
    pub positions: HashMap<PositionKey, Position>,
    pub realized_pnl: Quote,
    pub fees_paid: Quote,
    next_order_id: u64,
}

impl Account {
    pub fn new(initial_balance: Quote, fee_rate: Decimal, margin_mode: MarginMode) -> Self {
        Self {
            wallet_balance: initial_balance,
            available_balance: initial_balance,
            fee_rate,
            margin_mode,
            positions: HashMap::new(),
            realized_pnl: Quote::zero(),
            fees_paid: Quote::zero(),
            next_order_id: 1,
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(
            Quote::new(config.initial_balance),
            config.fee_rate,
            config.margin_mode,
        )
    }

    pub fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    // fills handed out so far
    pub fn order_count(&self) -> u64 {
        self.next_order_id - 1
    }

    pub fn get_position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn get_position_mut(&mut self, key: &PositionKey) -> Option<&mut Position> {
        self.positions.get_mut(key)
    }

    pub fn has_position(&self, key: &PositionKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn set_position(&mut self, position: Position) {
        self.positions.insert(position.key(), position);
    }

    pub fn remove_position(&mut self, key: &PositionKey) -> Option<Position> {
        self.positions.remove(key)
    }

    // long then short, whichever exist
    pub fn positions_for_symbol_mut<'a>(
        &'a mut self,
        symbol: &'a str,
    ) -> impl Iterator<Item = &'a mut Position> + 'a {
        self.positions
            .iter_mut()
            .filter(move |(key, _)| key.symbol == symbol)
            .map(|(_, position)| position)
    }

    // 10.1: margin + fee leave available, only the fee leaves the wallet
    pub fn reserve_margin(&mut self, margin: Quote, fee: Quote) -> Result<(), AccountError> {
        let required = margin.checked_add(fee).ok_or(AccountError::BalanceOverflow)?;
        if self.available_balance < required {
            return Err(AccountError::InsufficientBalance {
                required,
                available: self.available_balance,
            });
        }
        let available = self
            .available_balance
            .checked_sub(required)
            .ok_or(AccountError::BalanceOverflow)?;
        let (wallet, fees_paid) = self.fee_charged(fee)?;

        self.available_balance = available;
        self.wallet_balance = wallet;
        self.fees_paid = fees_paid;
        Ok(())
    }

    // 10.2: released margin plus pnl net of fee goes back to available; wallet sees pnl - fee.
    // nothing is written unless every sum fits
    pub fn settle_close(&mut self, margin_released: Quote, pnl: Quote, fee: Quote) -> Result<(), AccountError> {
        let available = self
            .available_balance
            .checked_add(margin_released)
            .and_then(|b| b.checked_add(pnl))
            .and_then(|b| b.checked_sub(fee))
            .ok_or(AccountError::BalanceOverflow)?;
        let realized = self
            .realized_pnl
            .checked_add(pnl)
            .ok_or(AccountError::BalanceOverflow)?;
        let (wallet, fees_paid) = self.fee_charged(fee)?;
        let wallet = wallet.checked_add(pnl).ok_or(AccountError::BalanceOverflow)?;

        self.available_balance = available;
        self.wallet_balance = wallet;
        self.realized_pnl = realized;
        self.fees_paid = fees_paid;
        Ok(())
    }

    // wallet and fee total after charging `fee`
    fn fee_charged(&self, fee: Quote) -> Result<(Quote, Quote), AccountError> {
        let wallet = self.wallet_balance.checked_sub(fee);
        let fees_paid = self.fees_paid.checked_add(fee);
        wallet.zip(fees_paid).ok_or(AccountError::BalanceOverflow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("insufficient available balance: need {required:.4}, available {available:.4}")]
    InsufficientBalance { required: Quote, available: Quote },

    #[error("balance out of representable range")]
    BalanceOverflow,
}

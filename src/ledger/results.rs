// 8.0.2: result types and errors for ledger operations.
// snapshots serialize with every alias name the exchange-shaped consumers read,
// but each value is computed once.

use crate::account::AccountError;
use crate::price_feed::OracleError;
use crate::types::{MarginMode, OrderId, Side};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillStatus {
    Filled,
}

/// Synthetic confirmation for a simulated market order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FillAck {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    pub symbol: String,
    pub status: FillStatus,
    #[serde(rename = "avgPrice")]
    pub avg_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub wallet_balance: Decimal,
    pub available_balance: Decimal,
    /// Sum over positions that could be priced; the rest are skipped.
    pub total_unrealized_profit: Decimal,
}

impl Serialize for AccountSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AccountSnapshot", 6)?;
        s.serialize_field("totalWalletBalance", &self.wallet_balance)?;
        s.serialize_field("wallet_balance", &self.wallet_balance)?;
        s.serialize_field("balance", &self.wallet_balance)?;
        s.serialize_field("availableBalance", &self.available_balance)?;
        s.serialize_field("available_margin", &self.available_balance)?;
        s.serialize_field("totalUnrealizedProfit", &self.total_unrealized_profit)?;
        s.end()
    }
}

/// One priced position as shown to callers. All figures are derived from a
/// copy taken under the lock, so they may already be stale on return.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub side: Side,
    /// Negative for shorts.
    pub position_amt: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub leverage: u32,
    pub unrealized_profit: Decimal,
    pub liquidation_price: Decimal,
    pub margin_type: MarginMode,
    pub isolated_margin: Decimal,
    pub notional_value: Decimal,
    pub maint_margin: Decimal,
    pub margin_ratio: Decimal,
    pub position_cost: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub update_time: i64,
    pub available_balance: Decimal,
    /// Position margin when isolated, the whole wallet when cross.
    pub cross_wallet_balance: Decimal,
}

impl PositionSnapshot {
    pub fn position_side(&self) -> &'static str {
        self.side.as_upper()
    }
}

impl Serialize for PositionSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PositionSnapshot", 25)?;
        s.serialize_field("symbol", &self.symbol)?;
        s.serialize_field("side", &self.side)?;
        s.serialize_field("positionSide", self.position_side())?;
        s.serialize_field("positionAmt", &self.position_amt)?;
        s.serialize_field("entryPrice", &self.entry_price)?;
        s.serialize_field("leverage", &self.leverage)?;
        s.serialize_field("markPrice", &self.mark_price)?;
        s.serialize_field("unRealizedProfit", &self.unrealized_profit)?;
        s.serialize_field("unrealizedProfit", &self.unrealized_profit)?;
        s.serialize_field("liquidationPrice", &self.liquidation_price)?;
        s.serialize_field("marginType", &self.margin_type)?;
        s.serialize_field("isolatedMargin", &self.isolated_margin)?;
        s.serialize_field("positionMargin", &self.isolated_margin)?;
        s.serialize_field("initialMargin", &self.isolated_margin)?;
        s.serialize_field("isolatedWallet", &self.isolated_margin)?;
        s.serialize_field("notionalValue", &self.notional_value)?;
        s.serialize_field("maintMargin", &self.maint_margin)?;
        s.serialize_field("marginRatio", &self.margin_ratio)?;
        s.serialize_field("positionCost", &self.position_cost)?;
        s.serialize_field("stopLoss", &self.stop_loss)?;
        s.serialize_field("takeProfit", &self.take_profit)?;
        s.serialize_field("updateTime", &self.update_time)?;
        s.serialize_field("maxNotionalValue", &Decimal::ZERO)?;
        s.serialize_field("availableBalance", &self.available_balance)?;
        s.serialize_field("crossWalletBalance", &self.cross_wallet_balance)?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("leverage must be positive")]
    InvalidLeverage,

    #[error("close quantity must be positive")]
    InvalidCloseQuantity,

    #[error(transparent)]
    MarketData(#[from] OracleError),

    #[error("{symbol} already has an open {side} position")]
    PositionExists { symbol: String, side: Side },

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("no open {side} position for {symbol}")]
    PositionNotFound { symbol: String, side: Side },

    #[error("order size out of range for {symbol}")]
    Overflow { symbol: String },
}

// 4.0: open position tracking. one record per (symbol, side), hedge mode.
// pnl = (mark - entry) * qty for longs, mirrored for shorts.
// 4.1 has the partial/full reduce logic at the bottom.

use crate::types::{Leverage, MarginMode, PositionKey, Price, Quote, Side, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    /// Unsigned size in base units. The side carries direction.
    pub quantity: Decimal,
    pub entry_price: Price,
    pub leverage: Leverage,
    pub margin_used: Quote,
    /// Advisory trigger prices, zero when unset. Nothing watches these.
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub margin_mode: MarginMode,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        entry_price: Price,
        leverage: Leverage,
        margin_used: Quote,
        margin_mode: MarginMode,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            leverage,
            margin_used,
            stop_loss: Decimal::ZERO,
            take_profit: Decimal::ZERO,
            margin_mode,
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.symbol.clone(), self.side)
    }

    // shorts report negative, exchange style
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.quantity
    }

    // 4.2: paper gains/losses based on current price
    pub fn unrealized_pnl(&self, mark_price: Price) -> Option<Quote> {
        calculate_unrealized_pnl(self.side, self.entry_price, mark_price, self.quantity)
    }
}

// 4.3: the pnl formula. direction comes from the side, not the sign of qty.
// None when the result does not fit in a Decimal.
pub fn calculate_unrealized_pnl(
    side: Side,
    entry_price: Price,
    mark_price: Price,
    quantity: Decimal,
) -> Option<Quote> {
    let move_per_unit = match side {
        Side::Long => mark_price.value().checked_sub(entry_price.value())?,
        Side::Short => entry_price.value().checked_sub(mark_price.value())?,
    };
    move_per_unit.checked_mul(quantity).map(Quote::new)
}

pub fn calculate_realized_pnl(
    side: Side,
    entry_price: Price,
    exit_price: Price,
    close_quantity: Decimal,
) -> Option<Quote> {
    calculate_unrealized_pnl(side, entry_price, exit_price, close_quantity)
}

#[derive(Debug, Clone)]
pub struct PositionUpdate {
    /// None when the whole position was closed.
    pub new_position: Option<Position>,
    pub closed_quantity: Decimal,
    pub realized_pnl: Quote,
    pub margin_released: Quote,
}

// 4.4: anything outside (0, quantity) means "close everything"
pub fn resolve_close_quantity(position: &Position, requested: Decimal) -> Decimal {
    if requested > Decimal::ZERO && requested < position.quantity {
        requested
    } else {
        position.quantity
    }
}

// 4.5: margin comes back pro rata, entry price stays where it was.
// None only when the realized pnl overflows.
pub fn reduce_position(
    position: &Position,
    close_quantity: Decimal,
    fill_price: Price,
    timestamp: Timestamp,
) -> Option<PositionUpdate> {
    debug_assert!(close_quantity > Decimal::ZERO, "close quantity must be positive");
    debug_assert!(close_quantity <= position.quantity);

    let realized = calculate_realized_pnl(position.side, position.entry_price, fill_price, close_quantity)?;

    if close_quantity == position.quantity {
        return Some(PositionUpdate {
            new_position: None,
            closed_quantity: close_quantity,
            realized_pnl: realized,
            margin_released: position.margin_used,
        });
    }

    let proportion = close_quantity / position.quantity;
    let margin_released = position.margin_used.mul(proportion);

    let new_position = Position {
        quantity: position.quantity - close_quantity,
        margin_used: position.margin_used.sub(margin_released),
        updated_at: timestamp,
        ..position.clone()
    };

    Some(PositionUpdate {
        new_position: Some(new_position),
        closed_quantity: close_quantity,
        realized_pnl: realized,
        margin_released,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_position(side: Side) -> Position {
        Position::new(
            "BTCUSDT",
            side,
            dec!(2),
            Price::new_unchecked(dec!(50000)),
            Leverage::new(10).unwrap(),
            Quote::new(dec!(10000)),
            MarginMode::Cross,
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn unrealized_pnl_long_profit() {
        let pos = test_position(Side::Long);
        let mark = Price::new_unchecked(dec!(52000));
        assert_eq!(pos.unrealized_pnl(mark).unwrap().value(), dec!(4000));
    }

    #[test]
    fn unrealized_pnl_long_loss() {
        let pos = test_position(Side::Long);
        let mark = Price::new_unchecked(dec!(48000));
        assert_eq!(pos.unrealized_pnl(mark).unwrap().value(), dec!(-4000));
    }

    #[test]
    fn unrealized_pnl_short_mirrors_long() {
        let pos = test_position(Side::Short);
        assert_eq!(
            pos.unrealized_pnl(Price::new_unchecked(dec!(48000))).unwrap().value(),
            dec!(4000)
        );
        assert_eq!(
            pos.unrealized_pnl(Price::new_unchecked(dec!(52000))).unwrap().value(),
            dec!(-4000)
        );
    }

    #[test]
    fn signed_quantity_for_short_is_negative() {
        assert_eq!(test_position(Side::Short).signed_quantity(), dec!(-2));
        assert_eq!(test_position(Side::Long).signed_quantity(), dec!(2));
    }

    #[test]
    fn close_quantity_resolution() {
        let pos = test_position(Side::Long);
        assert_eq!(resolve_close_quantity(&pos, dec!(0.5)), dec!(0.5));
        assert_eq!(resolve_close_quantity(&pos, dec!(0)), dec!(2));
        assert_eq!(resolve_close_quantity(&pos, dec!(-1)), dec!(2));
        assert_eq!(resolve_close_quantity(&pos, dec!(2)), dec!(2));
        assert_eq!(resolve_close_quantity(&pos, dec!(5)), dec!(2));
    }

    #[test]
    fn reduce_position_partial() {
        let pos = test_position(Side::Long);
        let update = reduce_position(
            &pos,
            dec!(0.5),
            Price::new_unchecked(dec!(52000)),
            Timestamp::from_millis(1000),
        )
        .unwrap();

        let remaining = update.new_position.unwrap();
        assert_eq!(remaining.quantity, dec!(1.5));
        assert_eq!(remaining.entry_price.value(), dec!(50000));
        assert_eq!(remaining.margin_used.value(), dec!(7500));
        assert_eq!(remaining.updated_at, Timestamp::from_millis(1000));
        assert_eq!(remaining.opened_at, Timestamp::from_millis(0));

        assert_eq!(update.margin_released.value(), dec!(2500));
        assert_eq!(update.realized_pnl.value(), dec!(1000));
    }

    #[test]
    fn reduce_position_full_close() {
        let pos = test_position(Side::Short);
        let update = reduce_position(
            &pos,
            dec!(2),
            Price::new_unchecked(dec!(51000)),
            Timestamp::from_millis(1000),
        )
        .unwrap();

        assert!(update.new_position.is_none());
        assert_eq!(update.realized_pnl.value(), dec!(-2000));
        assert_eq!(update.margin_released.value(), dec!(10000));
    }

    #[test]
    fn pnl_overflow_is_none() {
        let mut pos = test_position(Side::Short);
        pos.quantity = dec!(100_000_000_000_000);
        let mark = Price::new_unchecked(dec!(10_000_000_000_000_000));
        assert!(pos.unrealized_pnl(mark).is_none());
        assert!(reduce_position(&pos, dec!(1), mark, Timestamp::from_millis(1)).is_some());
        assert!(reduce_position(&pos, pos.quantity, mark, Timestamp::from_millis(1)).is_none());
    }
}

//! Read-only projections.
//!
//! Queries copy the account under the lock, release it, and only then look up
//! prices and run the risk math. A symbol the oracle cannot price is left out
//! of the figures rather than failing the whole call.

use super::core::SimulatedTrader;
use super::results::{AccountSnapshot, PositionSnapshot};
use crate::margin::{liquidation_price, maintenance_margin, margin_ratio, notional_value, position_cost};
use crate::position::Position;
use crate::price_feed::PriceOracle;
use crate::types::{Leverage, Price, Quote};

impl<O: PriceOracle> SimulatedTrader<O> {
    pub fn balance(&self) -> AccountSnapshot {
        let (positions, wallet, available) = self.snapshot();

        let total_unrealized = positions
            .iter()
            .filter_map(|position| {
                let mark = self.mark_price_or_skip(position)?;
                position.unrealized_pnl(mark)
            })
            // a contribution that would overflow the total is dropped like an unpriced one
            .fold(Quote::zero(), |total, pnl| total.checked_add(pnl).unwrap_or(total));

        AccountSnapshot {
            wallet_balance: wallet.value(),
            available_balance: available.value(),
            total_unrealized_profit: total_unrealized.value(),
        }
    }

    /// Priced positions, ordered by symbol then side.
    pub fn positions(&self) -> Vec<PositionSnapshot> {
        let (mut positions, wallet, available) = self.snapshot();
        positions.sort_by(|a, b| (&a.symbol, a.side).cmp(&(&b.symbol, b.side)));

        positions
            .iter()
            .filter_map(|position| {
                let mark = self.mark_price_or_skip(position)?;
                let snapshot = project(position, mark, wallet, available);
                if snapshot.is_none() {
                    tracing::trace!(symbol = %position.symbol, "skipping position with out-of-range figures");
                }
                snapshot
            })
            .collect()
    }

    fn mark_price_or_skip(&self, position: &Position) -> Option<Price> {
        match self.price(&position.symbol) {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::trace!(symbol = %position.symbol, error = %e, "skipping unpriced position");
                None
            }
        }
    }
}

// 8.3: all display math for one position. uses the live wallet for margin ratio.
// None when a figure does not fit in a Decimal
fn project(position: &Position, mark: Price, wallet: Quote, available: Quote) -> Option<PositionSnapshot> {
    let leverage = position.leverage.max(Leverage::ONE);
    let signed_quantity = position.signed_quantity();
    let margin_used = position.margin_used;

    let cross_wallet_balance = if position.margin_mode.is_cross() {
        wallet
    } else {
        margin_used
    };

    Some(PositionSnapshot {
        symbol: position.symbol.clone(),
        side: position.side,
        position_amt: signed_quantity,
        entry_price: position.entry_price.value(),
        mark_price: mark.value(),
        leverage: position.leverage.get(),
        unrealized_profit: position.unrealized_pnl(mark)?.value(),
        liquidation_price: liquidation_price(position.side, position.entry_price, leverage.value()),
        margin_type: position.margin_mode,
        isolated_margin: margin_used.value(),
        notional_value: notional_value(mark, signed_quantity)?.value(),
        maint_margin: maintenance_margin(margin_used, leverage).value(),
        margin_ratio: margin_ratio(margin_used, wallet)?,
        position_cost: position_cost(position.entry_price, signed_quantity)?.value(),
        stop_loss: position.stop_loss,
        take_profit: position.take_profit,
        update_time: position.updated_at.as_millis(),
        available_balance: available.value(),
        cross_wallet_balance: cross_wallet_balance.value(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_feed::PriceBook;
    use crate::types::{MarginMode, Side};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn setup(is_cross: bool) -> (Arc<PriceBook>, SimulatedTrader<Arc<PriceBook>>) {
        let book = Arc::new(PriceBook::with_prices([("BTCUSDT", dec!(100)), ("ETHUSDT", dec!(20))]));
        let trader = SimulatedTrader::new(book.clone(), dec!(1000), is_cross);
        (book, trader)
    }

    #[test]
    fn balance_without_positions() {
        let (_, trader) = setup(true);
        let balance = trader.balance();
        assert_eq!(balance.wallet_balance, dec!(1000));
        assert_eq!(balance.available_balance, dec!(1000));
        assert_eq!(balance.total_unrealized_profit, Decimal::ZERO);
    }

    #[test]
    fn balance_sums_hedged_pnl() {
        let (book, trader) = setup(true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_short("BTCUSDT", dec!(0.5), 10).unwrap();
        trader.open_short("ETHUSDT", dec!(2), 5).unwrap();

        book.set_price("BTCUSDT", dec!(110));
        book.set_price("ETHUSDT", dec!(18));

        // long +10, short -5, eth short +4
        assert_eq!(trader.balance().total_unrealized_profit, dec!(9));
    }

    #[test]
    fn balance_skips_unpriced_symbols() {
        let (book, trader) = setup(true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_long("ETHUSDT", dec!(1), 10).unwrap();

        book.set_price("BTCUSDT", dec!(90));
        book.remove("ETHUSDT");

        let balance = trader.balance();
        assert_eq!(balance.total_unrealized_profit, dec!(-10));
        // 0.04 + 0.008 fees
        assert_eq!(balance.wallet_balance, dec!(999.952));
    }

    #[test]
    fn positions_projection_long_cross() {
        let (book, trader) = setup(true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.set_stop_loss("BTCUSDT", "LONG", dec!(1), dec!(95)).unwrap();
        book.set_price("BTCUSDT", dec!(105));

        let positions = trader.positions();
        assert_eq!(positions.len(), 1);
        let p = &positions[0];

        assert_eq!(p.symbol, "BTCUSDT");
        assert_eq!(p.side, Side::Long);
        assert_eq!(p.position_side(), "LONG");
        assert_eq!(p.position_amt, dec!(1));
        assert_eq!(p.entry_price, dec!(100));
        assert_eq!(p.mark_price, dec!(105));
        assert_eq!(p.leverage, 10);
        assert_eq!(p.unrealized_profit, dec!(5));
        assert_eq!(p.liquidation_price, dec!(90));
        assert_eq!(p.margin_type, MarginMode::Cross);
        assert_eq!(p.isolated_margin, dec!(10));
        assert_eq!(p.notional_value, dec!(105));
        assert_eq!(p.maint_margin, dec!(1));
        assert_eq!(p.margin_ratio, dec!(10) / dec!(999.96));
        assert_eq!(p.position_cost, dec!(100));
        assert_eq!(p.stop_loss, dec!(95));
        assert_eq!(p.take_profit, Decimal::ZERO);
        assert_eq!(p.available_balance, dec!(989.96));
        assert_eq!(p.cross_wallet_balance, dec!(999.96));
    }

    #[test]
    fn positions_projection_short_isolated() {
        let (_, trader) = setup(false);
        trader.open_short("ETHUSDT", dec!(5), 4).unwrap();

        let p = &trader.positions()[0];
        assert_eq!(p.position_amt, dec!(-5));
        assert_eq!(p.notional_value, dec!(100));
        assert_eq!(p.position_cost, dec!(100));
        assert_eq!(p.liquidation_price, dec!(25));
        assert_eq!(p.margin_type, MarginMode::Isolated);
        assert_eq!(p.isolated_margin, dec!(25));
        assert_eq!(p.cross_wallet_balance, dec!(25));
    }

    #[test]
    fn positions_reflect_leverage_change_in_display_only() {
        let (_, trader) = setup(true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.set_leverage("BTCUSDT", 20).unwrap();

        let p = &trader.positions()[0];
        assert_eq!(p.leverage, 20);
        assert_eq!(p.liquidation_price, dec!(95));
        assert_eq!(p.isolated_margin, dec!(10));
        assert_eq!(p.maint_margin, dec!(0.5));
    }

    #[test]
    fn positions_omit_unpriced_and_are_ordered() {
        let (book, trader) = setup(true);
        book.set_price("AAAUSDT", dec!(1));
        trader.open_short("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_long("AAAUSDT", dec!(1), 10).unwrap();
        trader.open_long("ETHUSDT", dec!(1), 10).unwrap();
        book.set_price("ETHUSDT", dec!(0));

        let keys: Vec<(String, Side)> = trader
            .positions()
            .into_iter()
            .map(|p| (p.symbol, p.side))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("AAAUSDT".to_string(), Side::Long),
                ("BTCUSDT".to_string(), Side::Long),
                ("BTCUSDT".to_string(), Side::Short),
            ]
        );
    }

    #[test]
    fn unrepresentable_figures_are_omitted() {
        let book = Arc::new(PriceBook::with_prices([("BTCUSDT", dec!(100)), ("MOON", dec!(1))]));
        let trader = SimulatedTrader::new(book.clone(), dec!(1_000_000_000_000), true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_short("MOON", dec!(100_000_000_000_000), 1_000_000).unwrap();

        book.set_price("BTCUSDT", dec!(110));
        book.set_price("MOON", dec!(10_000_000_000_000_000));

        let positions = trader.positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, "BTCUSDT");
        assert_eq!(trader.balance().total_unrealized_profit, dec!(10));
    }

    #[test]
    fn margin_ratio_tracks_live_wallet() {
        let (book, trader) = setup(true);
        trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
        trader.open_long("ETHUSDT", dec!(10), 10).unwrap();
        let before = trader.positions()[0].margin_ratio;

        book.set_price("ETHUSDT", dec!(30));
        trader.close_long("ETHUSDT", dec!(0)).unwrap();

        let after = trader.positions()[0].margin_ratio;
        assert!(after < before, "wallet grew so ratio should shrink");
    }
}

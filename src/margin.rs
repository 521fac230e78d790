//! Margin and liquidation figures for display.
//!
//! Initial margin is notional divided by leverage and is reserved once, at
//! open. Everything else in here is derived on read: maintenance margin,
//! margin ratio and liquidation price are recomputed from the current
//! leverage and wallet balance, so they drift as the account changes.
//!
//! The liquidation price is a single-position isolated approximation. It
//! ignores fees, funding and cross-margin pooling even for cross positions.

use crate::types::{Leverage, Price, Quote, Side};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenCost {
    pub notional: Quote,
    pub margin_required: Quote,
    pub fee: Quote,
}

impl OpenCost {
    // what leaves the available balance on open
    pub fn total(&self) -> Quote {
        self.margin_required.add(self.fee)
    }
}

// 3.1: every product below is checked. None means the figure does not fit in a Decimal.
pub fn open_cost(price: Price, quantity: Decimal, leverage: Leverage, fee_rate: Decimal) -> Option<OpenCost> {
    let notional = price.value().checked_mul(quantity)?;
    let margin_required = notional.checked_div(leverage.value())?;
    let fee = notional.checked_mul(fee_rate)?;
    // total() must not overflow either
    margin_required.checked_add(fee)?;
    Some(OpenCost {
        notional: Quote::new(notional),
        margin_required: Quote::new(margin_required),
        fee: Quote::new(fee),
    })
}

pub fn fill_fee(price: Price, quantity: Decimal, fee_rate: Decimal) -> Option<Quote> {
    price
        .value()
        .checked_mul(quantity)?
        .checked_mul(fee_rate)
        .map(Quote::new)
}

pub fn notional_value(price: Price, signed_quantity: Decimal) -> Option<Quote> {
    price.value().checked_mul(signed_quantity.abs()).map(Quote::new)
}

/// Returns zero when leverage is not positive, meaning "unknown". A price
/// too large to represent is reported the same way.
pub fn liquidation_price(side: Side, entry: Price, leverage: Decimal) -> Decimal {
    if leverage <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some(fraction) = Decimal::ONE.checked_div(leverage) else {
        return Decimal::ZERO;
    };
    let factor = match side {
        Side::Long => Decimal::ONE.checked_sub(fraction),
        Side::Short => Decimal::ONE.checked_add(fraction),
    };
    factor
        .and_then(|factor| entry.value().checked_mul(factor))
        .unwrap_or(Decimal::ZERO)
}

pub fn maintenance_margin(margin_used: Quote, leverage: Leverage) -> Quote {
    Quote::new(margin_used.value() / leverage.value())
}

// 3.2: live wallet, not the balance at open. zero wallet reads as zero ratio.
pub fn margin_ratio(margin_used: Quote, wallet_balance: Quote) -> Option<Decimal> {
    if wallet_balance.value().is_zero() {
        return Some(Decimal::ZERO);
    }
    margin_used.value().checked_div(wallet_balance.value())
}

pub fn position_cost(entry: Price, signed_quantity: Decimal) -> Option<Quote> {
    entry.value().checked_mul(signed_quantity.abs()).map(Quote::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn open_cost_example() {
        let cost = open_cost(
            Price::new_unchecked(dec!(100)),
            dec!(1),
            Leverage::new(10).unwrap(),
            dec!(0.0004),
        )
        .unwrap();
        assert_eq!(cost.notional.value(), dec!(100));
        assert_eq!(cost.margin_required.value(), dec!(10));
        assert_eq!(cost.fee.value(), dec!(0.04));
        assert_eq!(cost.total().value(), dec!(10.04));
    }

    #[test]
    fn liquidation_price_long_and_short() {
        let entry = Price::new_unchecked(dec!(100));
        assert_eq!(liquidation_price(Side::Long, entry, dec!(10)), dec!(90));
        assert_eq!(liquidation_price(Side::Short, entry, dec!(10)), dec!(110));
    }

    #[test]
    fn liquidation_price_unknown_without_leverage() {
        let entry = Price::new_unchecked(dec!(100));
        assert_eq!(liquidation_price(Side::Long, entry, dec!(0)), dec!(0));
        assert_eq!(liquidation_price(Side::Short, entry, dec!(-2)), dec!(0));
    }

    #[test]
    fn liquidation_at_1x_long_is_zero() {
        let entry = Price::new_unchecked(dec!(2500));
        assert_eq!(liquidation_price(Side::Long, entry, dec!(1)), dec!(0));
        assert_eq!(liquidation_price(Side::Short, entry, dec!(1)), dec!(5000));
    }

    #[test]
    fn display_margin_figures() {
        let margin = Quote::new(dec!(10));
        assert_eq!(
            maintenance_margin(margin, Leverage::new(10).unwrap()).value(),
            dec!(1)
        );
        assert_eq!(margin_ratio(margin, Quote::new(dec!(1000))), Some(dec!(0.01)));
        assert_eq!(margin_ratio(margin, Quote::zero()), Some(dec!(0)));
    }

    #[test]
    fn notional_uses_absolute_quantity() {
        let price = Price::new_unchecked(dec!(200));
        assert_eq!(notional_value(price, dec!(-1.5)).unwrap().value(), dec!(300));
        assert_eq!(position_cost(price, dec!(-1.5)).unwrap().value(), dec!(300));
    }

    #[test]
    fn close_fee() {
        let fee = fill_fee(Price::new_unchecked(dec!(110)), dec!(0.5), dec!(0.0004)).unwrap();
        assert_eq!(fee.value(), dec!(0.022));
    }

    #[test]
    fn oversized_figures_are_none() {
        let huge = Price::new_unchecked(dec!(10_000_000_000_000_000));
        let qty = dec!(100_000_000_000_000);
        assert!(open_cost(huge, qty, Leverage::ONE, dec!(0.0004)).is_none());
        assert!(fill_fee(huge, qty, dec!(0.0004)).is_none());
        assert!(notional_value(huge, -qty).is_none());
        assert!(position_cost(huge, qty).is_none());
        assert!(margin_ratio(Quote::new(Decimal::MAX), Quote::new(dec!(0.5))).is_none());
    }

    #[test]
    fn liquidation_price_out_of_range_is_unknown() {
        let top = Price::new_unchecked(Decimal::MAX);
        assert_eq!(liquidation_price(Side::Short, top, dec!(2)), Decimal::ZERO);
        let entry = Price::new_unchecked(dec!(100));
        assert_eq!(liquidation_price(Side::Long, entry, dec!(0.0000000000000000000000000001)), Decimal::ZERO);
    }
}

// Price Feed Integration
//
// The ledger never owns market data. It asks a PriceOracle for the current
// trade price of a symbol and treats anything that is not strictly positive as
// "no market data". PriceBook is the in-memory oracle used by the demo and the
// tests; a host process plugs in its own market cache instead.

use crate::types::Price;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("no market data for {0}")]
    NoMarketData(String),
}

/// Source of current trade prices, keyed by symbol.
pub trait PriceOracle: Send + Sync {
    fn current_price(&self, symbol: &str) -> Result<Decimal, OracleError>;
}

impl<T: PriceOracle + ?Sized> PriceOracle for Arc<T> {
    fn current_price(&self, symbol: &str) -> Result<Decimal, OracleError> {
        (**self).current_price(symbol)
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for &T {
    fn current_price(&self, symbol: &str) -> Result<Decimal, OracleError> {
        (**self).current_price(symbol)
    }
}

/// Adapts a lookup closure into an oracle.
///
/// ```
/// use paper_margin::{FnOracle, OracleError, PriceOracle};
/// use rust_decimal::Decimal;
///
/// let oracle = FnOracle::new(|symbol: &str| match symbol {
///     "BTCUSDT" => Ok(Decimal::from(100)),
///     other => Err(OracleError::UnknownSymbol(other.to_string())),
/// });
/// assert_eq!(oracle.current_price("BTCUSDT"), Ok(Decimal::from(100)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnOracle<F>(F);

impl<F> FnOracle<F>
where
    F: Fn(&str) -> Result<Decimal, OracleError> + Send + Sync,
{
    pub fn new(lookup: F) -> Self {
        Self(lookup)
    }
}

impl<F> PriceOracle for FnOracle<F>
where
    F: Fn(&str) -> Result<Decimal, OracleError> + Send + Sync,
{
    fn current_price(&self, symbol: &str) -> Result<Decimal, OracleError> {
        (self.0)(symbol)
    }
}

/// Looks up a price and rejects non-positive quotes.
pub fn resolve_price<O: PriceOracle + ?Sized>(oracle: &O, symbol: &str) -> Result<Price, OracleError> {
    let raw = oracle.current_price(symbol)?;
    Price::new(raw).ok_or_else(|| OracleError::NoMarketData(symbol.to_string()))
}

/// In-memory last-price cache. Cheap to share behind an `Arc`; writers and
/// the ledger's readers only contend on the map lock.
#[derive(Debug, Default)]
pub struct PriceBook {
    prices: RwLock<HashMap<String, Decimal>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let book = Self::new();
        for (symbol, price) in prices {
            book.set_price(symbol, price);
        }
        book
    }

    // stores whatever it is given. positivity is checked on the way out
    pub fn set_price(&self, symbol: impl Into<String>, price: Decimal) {
        self.prices.write().insert(symbol.into(), price);
    }

    pub fn remove(&self, symbol: &str) -> Option<Decimal> {
        self.prices.write().remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.read().is_empty()
    }
}

impl PriceOracle for PriceBook {
    fn current_price(&self, symbol: &str) -> Result<Decimal, OracleError> {
        self.prices
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| OracleError::UnknownSymbol(symbol.to_string()))
    }
}

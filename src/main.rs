//! Paper-trading simulation.
//!
//! Walks a simulated margin account through the position lifecycle: opening,
//! hedging, partial closes, price moves and the derived risk display.
//! Set `RUST_LOG=paper_margin=debug` to see every fill.

use paper_margin::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Paper Trading Account Simulation");
    println!("Hedge Mode, In-Memory Ledger, No Real Orders\n");

    scenario_1_round_trip();
    scenario_2_hedged_positions();
    scenario_3_partial_close();
    scenario_4_price_movement_and_risk();
    scenario_5_rejections();

    println!("\nAll simulations completed successfully.");
}

fn new_trader(prices: &[(&str, rust_decimal::Decimal)]) -> (Arc<PriceBook>, SimulatedTrader<Arc<PriceBook>>) {
    let book = Arc::new(PriceBook::with_prices(prices.iter().copied()));
    let trader = SimulatedTrader::new(book.clone(), dec!(1000), true);
    (book, trader)
}

fn print_balance<O: PriceOracle>(trader: &SimulatedTrader<O>) {
    let balance = trader.balance();
    println!(
        "  Wallet: ${:.4}  Available: ${:.4}  Unrealized: ${:.4}",
        balance.wallet_balance, balance.available_balance, balance.total_unrealized_profit
    );
}

/// Open and immediately close at the same price: two fees gone.
fn scenario_1_round_trip() {
    println!("Scenario 1: Open/Close Round Trip\n");

    let (_, trader) = new_trader(&[("BTCUSDT", dec!(100))]);
    print_balance(&trader);

    let ack = trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
    println!("  Open LONG 1 BTC @ ${} 10x, order #{}", ack.avg_price, ack.order_id);
    print_balance(&trader);

    let ack = trader.close_long("BTCUSDT", dec!(0)).unwrap();
    println!("  Close LONG @ ${}, order #{}", ack.avg_price, ack.order_id);
    print_balance(&trader);
    println!("  Fees paid: ${}\n", trader.fees_paid());
}

/// Long and short on the same symbol live side by side.
fn scenario_2_hedged_positions() {
    println!("Scenario 2: Hedge Mode\n");

    let (book, trader) = new_trader(&[("BTCUSDT", dec!(100))]);
    trader.open_long("BTCUSDT", dec!(2), 10).unwrap();
    trader.open_short("BTCUSDT", dec!(1), 5).unwrap();

    book.set_price("BTCUSDT", dec!(104));
    for p in trader.positions() {
        println!(
            "  {} {} {} @ ${}  mark ${}  uPnL ${}",
            p.symbol,
            p.position_side(),
            p.position_amt,
            p.entry_price,
            p.mark_price,
            p.unrealized_profit
        );
    }
    print_balance(&trader);
    println!();
}

/// Closing part of a position returns margin pro rata.
fn scenario_3_partial_close() {
    println!("Scenario 3: Partial Close\n");

    let (_, trader) = new_trader(&[("ETHUSDT", dec!(20))]);
    trader.open_long("ETHUSDT", dec!(4), 2).unwrap();
    let before = trader.position("ETHUSDT", Side::Long).unwrap();
    println!("  Open 4 ETH, margin ${}", before.margin_used);

    trader.close_long("ETHUSDT", dec!(1)).unwrap();
    let after = trader.position("ETHUSDT", Side::Long).unwrap();
    println!(
        "  Closed 1 ETH: {} left, margin ${}, entry still ${}",
        after.quantity, after.margin_used, after.entry_price
    );
    println!("  Formatted size: {}\n", trader.format_quantity("ETHUSDT", after.quantity));
}

/// Price moves change unrealized pnl and the display figures.
fn scenario_4_price_movement_and_risk() {
    println!("Scenario 4: Price Movement and Risk Display\n");

    let (book, trader) = new_trader(&[("BTCUSDT", dec!(100))]);
    trader.open_long("BTCUSDT", dec!(1), 10).unwrap();
    trader.set_stop_loss("BTCUSDT", "LONG", dec!(1), dec!(92)).unwrap();
    trader.set_take_profit("BTCUSDT", "LONG", dec!(1), dec!(120)).unwrap();

    for price in [dec!(105), dec!(95), dec!(91)] {
        book.set_price("BTCUSDT", price);
        let p = &trader.positions()[0];
        println!(
            "  Mark ${}: uPnL ${}  liq ${}  maint ${}  ratio {:.4}  SL ${} TP ${}",
            p.mark_price,
            p.unrealized_profit,
            p.liquidation_price,
            p.maint_margin,
            p.margin_ratio,
            p.stop_loss,
            p.take_profit
        );
    }

    trader.set_leverage("BTCUSDT", 20).unwrap();
    let p = &trader.positions()[0];
    println!("  After 20x: liq ${}, reserved margin still ${}\n", p.liquidation_price, p.isolated_margin);
}

/// Every rejection leaves the account untouched.
fn scenario_5_rejections() {
    println!("Scenario 5: Rejections\n");

    let (_, trader) = new_trader(&[("BTCUSDT", dec!(100))]);
    trader.open_long("BTCUSDT", dec!(1), 10).unwrap();

    let attempts = [
        ("zero quantity", trader.open_short("BTCUSDT", dec!(0), 10)),
        ("duplicate open", trader.open_long("BTCUSDT", dec!(1), 10)),
        ("too large", trader.open_short("BTCUSDT", dec!(500), 10)),
        ("no market data", trader.open_long("DOGEUSDT", dec!(1), 10)),
        ("missing position", trader.close_short("BTCUSDT", dec!(1))),
    ];
    for (label, result) in attempts {
        match result {
            Ok(ack) => println!("  {label}: unexpectedly filled #{}", ack.order_id),
            Err(e) => println!("  {label}: {e}"),
        }
    }
    print_balance(&trader);
}

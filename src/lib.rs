// paper-margin: paper-trading derivatives account simulator.
// emulates an exchange margin account in memory: balances, hedge-mode
// positions, fees, margin and derived risk figures. no real orders.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Side, MarginMode, PositionKey, Price, Quote, Leverage
//   3.x  margin.rs: open cost, fees, liquidation price, display margin figures
//   4.x  position.rs: position struct, PnL, partial/full reduce
//   7.x  config.rs: starting balance, fee rate, margin mode, presets
//   8.x  ledger/: simulated trader: open/close, settings, snapshots
//   9.x  price_feed.rs: oracle trait + in-memory price book
//   10.x account.rs: wallet/available balances and the position map

pub mod account;
pub mod config;
pub mod ledger;
pub mod margin;
pub mod position;
pub mod price_feed;
pub mod types;

// re exports for convenience
pub use account::*;
pub use config::*;
pub use ledger::*;
pub use margin::*;
pub use position::*;
pub use price_feed::*;
pub use types::*;

// 8.0: the account ledger. opens and closes positions, records position
// settings, and serves read-only snapshots. one mutex guards all account state;
// mutations hold it end to end, queries only long enough to copy.

mod core;
mod orders;
mod positions;
mod queries;
mod results;

pub use self::core::SimulatedTrader;
pub use results::{AccountSnapshot, FillAck, FillStatus, LedgerError, PositionSnapshot};

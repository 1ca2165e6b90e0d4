pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::PnlSource;
pub use error::CoreError;
pub use structs::{CashFlow, DailyRecord, EquityPoint, RawTrade, Timestamped, Trade};

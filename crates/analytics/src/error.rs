use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("No trades were supplied")]
    NoTrades,

    #[error("None of the {0} trade records has a parsable timestamp")]
    NoResolvableTimestamps(usize),

    #[error("None of the {0} trade records has a parsable P&L value")]
    NoResolvablePnl(usize),

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

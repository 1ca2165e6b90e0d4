use serde::{Deserialize, Serialize};

/// Which of a trade's P&L fields produced its gross cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnlSource {
    /// The percentage field, applied to the stake.
    Percent,
    /// The broker-reported dollar field.
    Absolute,
    /// Neither field was usable under the active sizing policy; gross P&L is zero.
    Unused,
}

impl PnlSource {
    /// Returns true when the trade contributed a non-zero gross P&L source.
    pub fn is_used(&self) -> bool {
        !matches!(self, PnlSource::Unused)
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Anything positioned on the trade timeline.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

/// A closed-trade record exactly as an ingestion collaborator hands it over.
///
/// Fields are kept as text so that parsing policy (lenient money values, dropped rows on
/// bad timestamps) lives in one place, the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub timestamp: String,
    pub pnl: String,
    #[serde(default)]
    pub pnl_percent: Option<String>,
}

impl RawTrade {
    pub fn new(timestamp: impl Into<String>, pnl: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            pnl: pnl.into(),
            pnl_percent: None,
        }
    }

    /// Attaches a percentage P&L field to the record.
    pub fn with_percent(mut self, pnl_percent: impl Into<String>) -> Self {
        self.pnl_percent = Some(pnl_percent.into());
        self
    }
}

/// A normalized closed trade. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Wall-clock close time of the trade.
    pub timestamp: NaiveDateTime,
    /// Broker-reported absolute P&L in account currency.
    pub pnl: f64,
    /// Optional P&L expressed in percent of the position (e.g. `10.0` for +10%).
    pub pnl_percent: Option<f64>,
}

impl Trade {
    pub fn new(timestamp: NaiveDateTime, pnl: f64, pnl_percent: Option<f64>) -> Self {
        Self {
            timestamp,
            pnl,
            pnl_percent,
        }
    }

    /// The calendar day the trade closed on.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// The percentage P&L, only when it is present and non-zero.
    pub fn effective_percent(&self) -> Option<f64> {
        self.pnl_percent.filter(|pct| *pct != 0.0)
    }
}

impl Timestamped for Trade {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// The sized cash flow produced for one trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub timestamp: NaiveDateTime,
    /// Dollar amount allocated to the trade.
    pub stake: f64,
    pub gross_pnl: f64,
    /// Round-trip commission charged on the stake.
    pub commission: f64,
    pub net_pnl: f64,
    pub equity_before: f64,
    pub equity_after: f64,
    pub source: crate::enums::PnlSource,
}

impl CashFlow {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

impl Timestamped for CashFlow {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// One calendar day of account activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub start_equity: f64,
    pub end_equity: f64,
    /// Net P&L of the day, `end_equity - start_equity`.
    pub pnl: f64,
    pub trade_count: usize,
    /// `(end_equity - start_equity) / start_equity` as a fraction; zero when the day
    /// starts with no positive equity.
    pub daily_return: f64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, start_equity: f64, end_equity: f64, trade_count: usize) -> Self {
        let pnl = end_equity - start_equity;
        let daily_return = if start_equity > 0.0 {
            pnl / start_equity
        } else {
            0.0
        };

        Self {
            date,
            start_equity,
            end_equity,
            pnl,
            trade_count,
            daily_return,
        }
    }
}

/// A point in the portfolio's equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

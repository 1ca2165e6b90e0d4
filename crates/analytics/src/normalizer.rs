//! Turns raw ingested trade rows into a validated, time-ordered `Trade` sequence.
//!
//! Parsing is tolerant per record: a bad P&L value becomes zero, a bad timestamp drops the
//! row. The run only fails when nothing usable is left.

use crate::error::AnalyticsError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use core_types::{CoreError, RawTrade, Trade};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses a trade timestamp in any of the accepted layouts.
///
/// Offsets in RFC 3339 input are kept as local wall time; date-only values land on
/// midnight; a bare integer is read as epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, CoreError> {
    let value = value.trim();
    let invalid = || CoreError::UnparsableTimestamp(value.to_string());

    if value.is_empty() {
        return Err(invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).ok_or_else(invalid);
        }
    }

    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(invalid);
    }

    Err(invalid())
}

/// Parses a money or percentage value leniently.
///
/// Currency symbols, thousands separators, `%` and a leading `+` are ignored, and an
/// accounting-style `(12.50)` is negative.
pub fn parse_amount(value: &str) -> Result<f64, CoreError> {
    let trimmed = value.trim();
    let invalid = || CoreError::UnparsableAmount(value.to_string());

    let (negated, body) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | '+') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(invalid());
    }

    let parsed: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() {
        return Err(CoreError::NonFiniteAmount(value.to_string()));
    }

    Ok(if negated { -parsed.abs() } else { parsed })
}

/// Validates and sorts raw trade rows.
pub fn normalize(raw: &[RawTrade]) -> Result<Vec<Trade>, AnalyticsError> {
    if raw.is_empty() {
        return Err(AnalyticsError::NoTrades);
    }

    let mut trades = Vec::with_capacity(raw.len());
    let mut resolved_pnl = 0usize;

    for (row, record) in raw.iter().enumerate() {
        let timestamp = match parse_timestamp(&record.timestamp) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(row, error = %e, "Dropping trade with unparsable timestamp");
                continue;
            }
        };

        let pnl = parse_amount(&record.pnl);
        let pnl_percent = record
            .pnl_percent
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(parse_amount);

        if pnl.is_ok() || matches!(pnl_percent, Some(Ok(_))) {
            resolved_pnl += 1;
        }

        let pnl = pnl.unwrap_or_else(|e| {
            tracing::warn!(row, error = %e, "Treating unparsable P&L as zero");
            0.0
        });
        let pnl_percent = match pnl_percent {
            Some(Ok(pct)) => Some(pct),
            Some(Err(e)) => {
                tracing::warn!(row, error = %e, "Ignoring unparsable percentage P&L");
                None
            }
            None => None,
        };

        trades.push(Trade::new(timestamp, pnl, pnl_percent));
    }

    if trades.is_empty() {
        return Err(AnalyticsError::NoResolvableTimestamps(raw.len()));
    }
    if resolved_pnl == 0 {
        return Err(AnalyticsError::NoResolvablePnl(trades.len()));
    }

    // Stable, so same-instant trades keep their ledger order.
    trades.sort_by_key(|t| t.timestamp);

    let dropped = raw.len() - trades.len();
    tracing::debug!(kept = trades.len(), dropped, "Normalized trade records");

    Ok(trades)
}

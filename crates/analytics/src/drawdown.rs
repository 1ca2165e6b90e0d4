use chrono::NaiveDate;
use core_types::DailyRecord;
use serde::{Deserialize, Serialize};

/// One peak → trough → recovery cycle of the daily equity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEvent {
    /// Date of the equity peak the decline started from.
    pub start_date: NaiveDate,
    pub peak_equity: f64,
    pub trough_date: NaiveDate,
    pub trough_equity: f64,
    /// Recovery date, or the last date of the series for an unrecovered event.
    pub end_date: NaiveDate,
    /// Equity on `end_date`.
    pub recovery_equity: f64,
    pub recovered: bool,
    pub depth_usd: f64,
    pub depth_pct: f64,
    pub to_trough_days: i64,
    pub full_duration_days: i64,
}

impl DrawdownEvent {
    fn close(
        open: OpenDrawdown,
        end_date: NaiveDate,
        recovery_equity: f64,
        recovered: bool,
    ) -> Self {
        let depth_usd = open.peak_equity - open.trough_equity;
        let depth_pct = if open.peak_equity > 0.0 {
            depth_usd / open.peak_equity * 100.0
        } else {
            0.0
        };

        Self {
            start_date: open.start_date,
            peak_equity: open.peak_equity,
            trough_date: open.trough_date,
            trough_equity: open.trough_equity,
            end_date,
            recovery_equity,
            recovered,
            depth_usd,
            depth_pct,
            to_trough_days: (open.trough_date - open.start_date).num_days().max(0),
            full_duration_days: (end_date - open.start_date).num_days().max(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenDrawdown {
    start_date: NaiveDate,
    peak_equity: f64,
    trough_date: NaiveDate,
    trough_equity: f64,
}

#[derive(Debug, Clone, Copy)]
enum State {
    AtPeak { date: NaiveDate, equity: f64 },
    InDrawdown(OpenDrawdown),
}

/// Scans daily records for drawdown events.
///
/// The running peak starts at the first day's opening equity. An event opens on the
/// first close below the peak and closes on the first close at or above it; an event
/// still open after the last day is emitted as unrecovered.
pub fn detect(days: &[DailyRecord]) -> Vec<DrawdownEvent> {
    let mut events = Vec::new();
    let Some(first) = days.first() else {
        return events;
    };

    let mut state = State::AtPeak {
        date: first.date,
        equity: first.start_equity,
    };

    for day in days {
        state = match state {
            State::AtPeak { equity, .. } if day.end_equity >= equity => State::AtPeak {
                date: day.date,
                equity: day.end_equity,
            },
            State::AtPeak { date, equity } => State::InDrawdown(OpenDrawdown {
                start_date: date,
                peak_equity: equity,
                trough_date: day.date,
                trough_equity: day.end_equity,
            }),
            State::InDrawdown(open) if day.end_equity >= open.peak_equity => {
                events.push(DrawdownEvent::close(open, day.date, day.end_equity, true));
                State::AtPeak {
                    date: day.date,
                    equity: day.end_equity,
                }
            }
            State::InDrawdown(mut open) => {
                if day.end_equity < open.trough_equity {
                    open.trough_equity = day.end_equity;
                    open.trough_date = day.date;
                }
                State::InDrawdown(open)
            }
        };
    }

    if let (State::InDrawdown(open), Some(last)) = (state, days.last()) {
        events.push(DrawdownEvent::close(open, last.date, last.end_equity, false));
    }

    tracing::debug!(events = events.len(), "Detected drawdown events");
    events
}

/// Aggregate view over a list of drawdown events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DrawdownSummary {
    pub count: usize,
    pub recovered: usize,
    pub deepest_pct: f64,
    pub average_depth_pct: f64,
    pub longest_days: i64,
    pub average_duration_days: f64,
}

impl DrawdownSummary {
    pub fn from_events(events: &[DrawdownEvent]) -> Self {
        if events.is_empty() {
            return Self::default();
        }
        let count = events.len();
        Self {
            count,
            recovered: events.iter().filter(|e| e.recovered).count(),
            deepest_pct: events.iter().map(|e| e.depth_pct).fold(0.0, f64::max),
            average_depth_pct: events.iter().map(|e| e.depth_pct).sum::<f64>() / count as f64,
            longest_days: events.iter().map(|e| e.full_duration_days).max().unwrap_or(0),
            average_duration_days: events.iter().map(|e| e.full_duration_days as f64).sum::<f64>()
                / count as f64,
        }
    }
}

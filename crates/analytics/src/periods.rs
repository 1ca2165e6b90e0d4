use chrono::{Duration, NaiveDateTime};
use core_types::Timestamped;
use serde::Serialize;

/// A fixed-length statistics window holding at least one trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// 1-based position among the emitted (non-empty) windows.
    pub index: usize,
    /// Inclusive window start.
    pub start: NaiveDateTime,
    /// Exclusive window end.
    pub end: NaiveDateTime,
    /// Offset of the window's first trade in the time-ordered sequence.
    pub first_trade: usize,
    pub trade_count: usize,
}

impl Period {
    /// The window's share of a time-ordered sequence that was segmented.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.first_trade..self.first_trade + self.trade_count]
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// Partitions a time-ordered sequence into consecutive `[start, start + length)` windows
/// anchored at the first item's timestamp. Windows with no items are skipped without
/// consuming an index. A window whose end lies beyond the representable calendar is left
/// open (`end == NaiveDateTime::MAX`) and takes every remaining item.
pub fn segment<T: Timestamped>(items: &[T], length_ms: i64) -> Vec<Period> {
    let mut periods = Vec::new();
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return periods;
    };
    if length_ms <= 0 {
        return periods;
    }

    let length = Duration::try_milliseconds(length_ms);
    let last_timestamp = last.timestamp();
    let mut start = first.timestamp();
    let mut cursor = 0usize;

    while start <= last_timestamp {
        let end = length.and_then(|length| start.checked_add_signed(length));
        let first_trade = cursor;
        match end {
            Some(end) => {
                while cursor < items.len() && items[cursor].timestamp() < end {
                    cursor += 1;
                }
            }
            None => cursor = items.len(),
        }

        let trade_count = cursor - first_trade;
        if trade_count > 0 {
            periods.push(Period {
                index: periods.len() + 1,
                start,
                end: end.unwrap_or(NaiveDateTime::MAX),
                first_trade,
                trade_count,
            });
        }

        match end {
            Some(end) => start = end,
            None => break,
        }
    }

    tracing::debug!(periods = periods.len(), length_ms, "Segmented trade history");
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::Trade;

    const DAY_MS: i64 = 86_400_000;

    fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn trades(times: &[NaiveDateTime]) -> Vec<Trade> {
        times.iter().map(|&t| Trade::new(t, 1.0, None)).collect()
    }

    #[test]
    fn windows_are_anchored_on_first_trade() {
        let trades = trades(&[at(1, 1, 10), at(1, 2, 9), at(1, 2, 11), at(1, 3, 10)]);
        let periods = segment(&trades, DAY_MS);

        // [01 10:00, 02 10:00) holds the 01 and 02 09:00 trades; the end is exclusive so
        // the 03 10:00 trade opens a third window.
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].trade_count, 2);
        assert_eq!(periods[1].trade_count, 1);
        assert_eq!(periods[1].start, at(1, 2, 10));
        assert_eq!(periods[2].start, at(1, 3, 10));
    }

    #[test]
    fn empty_windows_are_omitted() {
        let trades = trades(&[at(1, 1, 0), at(1, 1, 5), at(1, 20, 0)]);
        let periods = segment(&trades, 7 * DAY_MS);

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].index, 1);
        assert_eq!(periods[1].index, 2);
        assert_eq!(periods[1].start, at(1, 15, 0));
        assert_eq!(periods[1].slice(&trades).len(), 1);
    }

    #[test]
    fn windows_partition_the_trades() {
        let trades = trades(&[
            at(1, 1, 0),
            at(1, 14, 0),
            at(2, 3, 0),
            at(3, 30, 0),
            at(4, 2, 0),
        ]);
        let periods = segment(&trades, 30 * DAY_MS);

        let total: usize = periods.iter().map(|p| p.trade_count).sum();
        assert_eq!(total, trades.len());
        for period in &periods {
            assert!(period.slice(&trades).iter().all(|t| period.contains(t.timestamp)));
        }
        for pair in periods.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn single_trade_gets_one_window() {
        let trades = trades(&[at(5, 5, 5)]);
        let periods = segment(&trades, DAY_MS);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].end, at(5, 6, 5));
    }

    #[test]
    fn window_past_the_calendar_takes_the_rest() {
        let trades = trades(&[at(1, 1, 0), at(6, 1, 0), at(12, 31, 23)]);

        for length_ms in [i64::MAX, 200_000_000 * DAY_MS] {
            let periods = segment(&trades, length_ms);
            assert_eq!(periods.len(), 1);
            assert_eq!(periods[0].trade_count, 3);
            assert_eq!(periods[0].end, NaiveDateTime::MAX);
        }
    }

    #[test]
    fn nothing_to_segment() {
        assert!(segment::<Trade>(&[], DAY_MS).is_empty());
    }
}

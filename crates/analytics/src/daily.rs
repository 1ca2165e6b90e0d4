use core_types::{CashFlow, DailyRecord};

/// Folds time-ordered cash flows into one record per calendar day.
///
/// The first day opens at the first flow's `equity_before` (the initial capital for a
/// full history, the carried equity for a period slice). Each later day opens where the
/// previous one closed. Days without trades are not represented.
pub fn aggregate(flows: &[CashFlow]) -> Vec<DailyRecord> {
    let mut days: Vec<DailyRecord> = Vec::new();
    let Some(first) = flows.first() else {
        return days;
    };

    let mut date = first.date();
    let mut start_equity = first.equity_before;
    let mut end_equity = first.equity_before;
    let mut trade_count = 0usize;

    for flow in flows {
        if flow.date() != date {
            days.push(DailyRecord::new(date, start_equity, end_equity, trade_count));
            date = flow.date();
            start_equity = end_equity;
            trade_count = 0;
        }
        end_equity = flow.equity_after;
        trade_count += 1;
    }
    days.push(DailyRecord::new(date, start_equity, end_equity, trade_count));

    tracing::debug!(days = days.len(), trades = flows.len(), "Aggregated daily records");
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use core_types::PnlSource;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn flows(rows: &[(u32, u32, f64)], initial: f64) -> Vec<CashFlow> {
        let mut equity = initial;
        rows.iter()
            .map(|&(day, hour, pnl)| {
                let flow = CashFlow {
                    timestamp: at(day, hour),
                    stake: 100.0,
                    gross_pnl: pnl,
                    commission: 0.0,
                    net_pnl: pnl,
                    equity_before: equity,
                    equity_after: equity + pnl,
                    source: PnlSource::Absolute,
                };
                equity += pnl;
                flow
            })
            .collect()
    }

    #[test]
    fn groups_trades_by_local_date() {
        let flows = flows(
            &[(1, 9, 50.0), (1, 23, -20.0), (3, 0, 10.0), (3, 12, 5.0), (4, 8, -100.0)],
            1_000.0,
        );
        let days = aggregate(&flows);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].trade_count, 2);
        assert_eq!(days[0].start_equity, 1_000.0);
        assert_eq!(days[0].end_equity, 1_030.0);
        assert_eq!(days[0].pnl, 30.0);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(days[1].pnl, 15.0);
        assert_eq!(days[2].end_equity, 945.0);
    }

    #[test]
    fn days_chain_equity() {
        let flows = flows(&[(1, 9, 10.0), (2, 9, -3.0), (5, 9, 7.0), (6, 9, 1.0)], 500.0);
        let days = aggregate(&flows);

        assert_eq!(days[0].start_equity, 500.0);
        for pair in days.windows(2) {
            assert_eq!(pair[1].start_equity, pair[0].end_equity);
        }
    }

    #[test]
    fn slice_opens_at_carried_equity() {
        let all = flows(&[(1, 9, 10.0), (2, 9, 20.0)], 100.0);
        let days = aggregate(&all[1..]);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].start_equity, 110.0);
        assert_eq!(days[0].end_equity, 130.0);
    }

    #[test]
    fn no_flows_no_days() {
        assert!(aggregate(&[]).is_empty());
    }
}

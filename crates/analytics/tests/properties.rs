use analytics::{AnalysisReport, AnalyticsEngine};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use configuration::{AnalysisConfig, PeriodUnit, PositionSizeType};
use core_types::Trade;
use proptest::prelude::*;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 1)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

/// (days since the previous trade, P&L, optional percentage P&L)
fn history() -> impl Strategy<Value = Vec<(i64, f64, Option<f64>)>> {
    prop::collection::vec(
        (0i64..4, -500.0f64..500.0, prop::option::of(-20.0f64..20.0)),
        1..60,
    )
}

fn sizing() -> impl Strategy<Value = (PositionSizeType, f64)> {
    prop_oneof![
        (Just(PositionSizeType::Fixed), 10.0f64..5_000.0),
        (Just(PositionSizeType::Percentage), 1.0f64..100.0),
    ]
}

fn trades(rows: &[(i64, f64, Option<f64>)]) -> Vec<Trade> {
    let mut at = base();
    rows.iter()
        .enumerate()
        .map(|(i, &(gap, pnl, pct))| {
            at += Duration::days(gap) + Duration::minutes(i as i64 % 5);
            Trade::new(at, pnl, pct)
        })
        .collect()
}

fn analyze(kind: PositionSizeType, size: f64, rows: &[(i64, f64, Option<f64>)]) -> AnalysisReport {
    let config = AnalysisConfig {
        position_size_type: kind,
        position_size: size,
        commission_rate: 0.0005,
        period_unit: PeriodUnit::Week,
        period_length: 2,
        ..AnalysisConfig::default()
    };
    AnalyticsEngine::new(config)
        .and_then(|engine| engine.analyze(&trades(rows)))
        .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn daily_equity_chains(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        prop_assert!(approx(report.daily[0].start_equity, 10_000.0));
        for pair in report.daily.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
            prop_assert_eq!(pair[0].end_equity, pair[1].start_equity);
        }
        let trade_total: usize = report.daily.iter().map(|d| d.trade_count).sum();
        prop_assert_eq!(trade_total, rows.len());
    }

    #[test]
    fn final_equity_matches_cash_flows(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        let net: f64 = report.cash_flows.iter().map(|f| f.net_pnl).sum();
        prop_assert!(approx(report.overall.final_equity, 10_000.0 + net));
        prop_assert!(approx(report.overall.total_pnl, net));
        let last = report.equity_curve.last().map(|p| p.equity).unwrap_or_default();
        prop_assert!(approx(last, report.overall.final_equity));
    }

    #[test]
    fn statistics_are_always_finite(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        prop_assert!(report.overall.is_finite());
        prop_assert!(report.periods.iter().all(|p| p.stats.is_finite()));
        prop_assert!(report.overall.max_drawdown_pct >= 0.0);
        prop_assert!(report.overall.var_95 + 1e-9 >= report.overall.cvar_95);
    }

    #[test]
    fn periods_partition_the_history(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        let covered: usize = report.periods.iter().map(|p| p.period.trade_count).sum();
        prop_assert_eq!(covered, rows.len());
        for (i, p) in report.periods.iter().enumerate() {
            prop_assert_eq!(p.period.index, i + 1);
            prop_assert!(p.period.trade_count > 0);
        }
        for pair in report.periods.windows(2) {
            prop_assert!(pair[0].period.end <= pair[1].period.start);
        }
    }

    #[test]
    fn drawdowns_are_ordered_and_disjoint(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        for event in &report.drawdowns {
            prop_assert!(event.start_date <= event.trough_date);
            prop_assert!(event.trough_date <= event.end_date);
            prop_assert!(event.depth_usd >= 0.0);
            prop_assert!(event.depth_pct <= report.overall.max_drawdown_pct + 1e-9);
        }
        for pair in report.drawdowns.windows(2) {
            prop_assert!(pair[0].recovered);
            prop_assert!(pair[0].end_date <= pair[1].start_date);
        }

        let last_close = report.daily[report.daily.len() - 1].end_equity;
        match report.drawdowns.last() {
            Some(event) if !event.recovered => prop_assert_eq!(event.recovery_equity, last_close),
            _ => {
                let peak = report
                    .daily
                    .iter()
                    .map(|d| d.end_equity)
                    .fold(report.daily[0].start_equity, f64::max);
                prop_assert_eq!(peak, last_close);
            }
        }
    }

    #[test]
    fn distributions_count_every_sample(rows in history(), (kind, size) in sizing()) {
        let report = analyze(kind, size, &rows);

        let pnl_total: usize = report.pnl_distribution.iter().map(|b| b.count).sum();
        prop_assert_eq!(pnl_total, rows.len());
        let depth_total: usize = report.drawdown_distribution.iter().map(|b| b.count).sum();
        prop_assert_eq!(depth_total, report.drawdowns.len());
    }
}

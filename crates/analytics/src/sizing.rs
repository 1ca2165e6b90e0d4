use configuration::{AnalysisConfig, PositionSizeType};
use core_types::{CashFlow, EquityPoint, PnlSource, Trade};

/// Converts broker-reported trade P&L into net dollar cash flows under a sizing policy.
///
/// The sizer is a fold over the trades in timestamp order: every stake is derived from
/// the equity left by the previous trade, so the input must already be sorted.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    initial_capital: f64,
    size_type: PositionSizeType,
    position_size: f64,
    commission_rate: f64,
}

impl PositionSizer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            initial_capital: config.initial_capital,
            size_type: config.position_size_type,
            position_size: config.position_size,
            commission_rate: config.commission_rate,
        }
    }

    /// The dollar stake for a trade taken with `equity` in the account.
    pub fn stake(&self, equity: f64) -> f64 {
        match self.size_type {
            PositionSizeType::Fixed => self.position_size,
            PositionSizeType::Percentage => equity.max(0.0) * self.position_size / 100.0,
        }
    }

    /// Sizes a single trade against the current equity.
    pub fn size_trade(&self, trade: &Trade, equity_before: f64) -> CashFlow {
        let stake = self.stake(equity_before);

        let (gross_pnl, source) = match (trade.effective_percent(), self.size_type) {
            (Some(pct), _) => (stake * pct / 100.0, PnlSource::Percent),
            (None, PositionSizeType::Fixed) => (trade.pnl, PnlSource::Absolute),
            // A dollar figure says nothing about a stake we chose ourselves.
            (None, PositionSizeType::Percentage) => (0.0, PnlSource::Unused),
        };

        let commission = stake * self.commission_rate;
        let net_pnl = gross_pnl - commission;

        CashFlow {
            timestamp: trade.timestamp,
            stake,
            gross_pnl,
            commission,
            net_pnl,
            equity_before,
            equity_after: equity_before + net_pnl,
            source,
        }
    }

    /// Sizes every trade in order, carrying equity from one to the next.
    pub fn cash_flows(&self, trades: &[Trade]) -> Vec<CashFlow> {
        let flows: Vec<CashFlow> = trades
            .iter()
            .scan(self.initial_capital, |equity, trade| {
                let flow = self.size_trade(trade, *equity);
                *equity = flow.equity_after;
                Some(flow)
            })
            .collect();

        let unused = flows.iter().filter(|f| !f.source.is_used()).count();
        if unused > 0 {
            tracing::warn!(
                unused,
                "Trades without a percentage P&L contribute nothing under percentage sizing"
            );
        }

        flows
    }

    /// The equity curve: an opening point at the first trade's timestamp, then one point
    /// after each trade.
    pub fn equity_curve(&self, flows: &[CashFlow]) -> Vec<EquityPoint> {
        let Some(first) = flows.first() else {
            return Vec::new();
        };

        std::iter::once(EquityPoint {
            timestamp: first.timestamp,
            equity: self.initial_capital,
        })
        .chain(flows.iter().map(|f| EquityPoint {
            timestamp: f.timestamp,
            equity: f.equity_after,
        }))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn config(size_type: PositionSizeType, size: f64, commission: f64) -> AnalysisConfig {
        AnalysisConfig {
            initial_capital: 10_000.0,
            position_size_type: size_type,
            position_size: size,
            commission_rate: commission,
            ..AnalysisConfig::default()
        }
    }

    fn percent_trades() -> Vec<Trade> {
        vec![
            Trade::new(at(1), 0.0, Some(10.0)),
            Trade::new(at(2), 0.0, Some(-5.0)),
            Trade::new(at(3), 0.0, Some(10.0)),
        ]
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn fixed_stake_applies_percent_to_stake() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Fixed, 100.0, 0.0));
        let flows = sizer.cash_flows(&percent_trades());

        let equities: Vec<f64> = flows.iter().map(|f| f.equity_after).collect();
        assert_eq!(equities, vec![10_010.0, 10_005.0, 10_015.0]);
        assert!(flows.iter().all(|f| f.stake == 100.0));
    }

    #[test]
    fn percentage_stake_compounds() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Percentage, 10.0, 0.0));
        let flows = sizer.cash_flows(&percent_trades());

        assert_close(flows[0].stake, 1_000.0);
        assert_close(flows[0].net_pnl, 100.0);
        assert_close(flows[0].equity_after, 10_100.0);
        assert_close(flows[1].stake, 1_010.0);
        assert_close(flows[1].net_pnl, -50.5);
        assert_close(flows[1].equity_after, 10_049.5);
        assert_close(flows[2].stake, 1_004.95);
        assert_close(flows[2].net_pnl, 100.495);
        assert_close(flows[2].equity_after, 10_149.995);
    }

    #[test]
    fn fixed_sizing_falls_back_to_dollar_pnl() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Fixed, 500.0, 0.0));
        let trades = vec![
            Trade::new(at(1), 42.0, None),
            Trade::new(at(2), -12.0, Some(0.0)),
        ];

        let flows = sizer.cash_flows(&trades);
        assert_eq!(flows[0].source, PnlSource::Absolute);
        assert_eq!(flows[0].gross_pnl, 42.0);
        assert_eq!(flows[1].gross_pnl, -12.0);
        assert_eq!(flows[1].equity_after, 10_030.0);
    }

    #[test]
    fn percentage_sizing_ignores_dollar_pnl() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Percentage, 10.0, 0.0));
        let flows = sizer.cash_flows(&[Trade::new(at(1), 250.0, None)]);

        assert_eq!(flows[0].source, PnlSource::Unused);
        assert_eq!(flows[0].gross_pnl, 0.0);
        assert_eq!(flows[0].equity_after, 10_000.0);
    }

    #[test]
    fn commission_is_charged_on_stake() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Fixed, 1_000.0, 0.002));
        let flows = sizer.cash_flows(&[Trade::new(at(1), 0.0, Some(1.0))]);

        assert_close(flows[0].commission, 2.0);
        assert_close(flows[0].net_pnl, 8.0);
        assert_close(flows[0].equity_after, 10_008.0);
    }

    #[test]
    fn no_stake_once_equity_is_gone() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Percentage, 50.0, 0.0));
        assert_eq!(sizer.stake(-20.0), 0.0);
    }

    #[test]
    fn equity_curve_has_opening_point() {
        let sizer = PositionSizer::new(&config(PositionSizeType::Fixed, 100.0, 0.0));
        let flows = sizer.cash_flows(&percent_trades());
        let curve = sizer.equity_curve(&flows);

        assert_eq!(curve.len(), 4);
        assert_eq!(curve[0].timestamp, at(1));
        assert_eq!(curve[0].equity, 10_000.0);
        assert_eq!(curve[3].equity, 10_015.0);
    }
}

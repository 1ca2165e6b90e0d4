use crate::error::AnalyticsError;
use crate::report::{AnalysisReport, PerformanceStats, PeriodStats};
use crate::sizing::PositionSizer;
use crate::stats::StatsInput;
use crate::{daily, distribution, drawdown, normalizer, periods, stats};
use configuration::AnalysisConfig;
use core_types::{CashFlow, RawTrade, Trade};

/// Runs the full analysis pipeline for one trade history.
///
/// The engine owns nothing but its per-run configuration, so one instance can analyze
/// any number of independent histories and repeated runs on the same input produce
/// identical reports.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalysisConfig,
}

impl AnalyticsEngine {
    /// Creates an engine, rejecting configurations outside their documented domain.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalyticsError> {
        config.validate().map_err(AnalyticsError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalizes raw ingested rows, then analyzes them.
    pub fn analyze_raw(&self, raw: &[RawTrade]) -> Result<AnalysisReport, AnalyticsError> {
        let trades = normalizer::normalize(raw)?;
        self.analyze(&trades)
    }

    /// Analyzes already-parsed trades. Out-of-order input is sorted by timestamp first.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AnalysisReport`, or `AnalyticsError::NoTrades` for an
    /// empty history.
    pub fn analyze(&self, trades: &[Trade]) -> Result<AnalysisReport, AnalyticsError> {
        if trades.is_empty() {
            return Err(AnalyticsError::NoTrades);
        }

        let mut ordered = trades.to_vec();
        if !ordered.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            tracing::debug!("Sorting trades into timestamp order");
            ordered.sort_by_key(|t| t.timestamp);
        }

        // 1. Sizing: sequential, each stake depends on the equity before it.
        let sizer = PositionSizer::new(&self.config);
        let cash_flows = sizer.cash_flows(&ordered);
        let equity_curve = sizer.equity_curve(&cash_flows);

        // 2. Daily equity.
        let daily = daily::aggregate(&cash_flows);
        let overall = stats::compute(&StatsInput::from_days(&daily, &cash_flows));

        // 3. Windowed statistics.
        let periods = periods::segment(&cash_flows, self.config.period_length_ms())
            .into_iter()
            .map(|period| PeriodStats {
                stats: window_stats(period.slice(&cash_flows)),
                period,
            })
            .collect::<Vec<_>>();

        // 4. Drawdown events and distributions.
        let drawdowns = drawdown::detect(&daily);

        let bin_size = self.config.bin_size_in_std_dev;
        let trade_pnl: Vec<f64> = cash_flows.iter().map(|f| f.net_pnl).collect();
        let pnl_distribution = distribution::build(&trade_pnl, bin_size);
        let depths: Vec<f64> = drawdowns.iter().map(|e| -e.depth_pct).collect();
        let drawdown_distribution = distribution::build(&depths, bin_size);

        tracing::info!(
            trades = cash_flows.len(),
            days = daily.len(),
            periods = periods.len(),
            drawdowns = drawdowns.len(),
            final_equity = overall.final_equity,
            total_return_pct = overall.total_return_pct,
            "Performance analysis complete"
        );

        Ok(AnalysisReport {
            overall,
            periods,
            equity_curve,
            cash_flows,
            daily,
            drawdowns,
            pnl_distribution,
            drawdown_distribution,
        })
    }
}

/// Statistics for a contiguous slice of the cash-flow sequence, opening at the equity the
/// slice inherits.
fn window_stats(flows: &[CashFlow]) -> PerformanceStats {
    let days = daily::aggregate(flows);
    stats::compute(&StatsInput::from_days(&days, flows))
}

use crate::distribution::DistributionBin;
use crate::drawdown::DrawdownEvent;
use crate::periods::Period;
use core_types::{CashFlow, DailyRecord, EquityPoint};
use serde::{Deserialize, Serialize};

/// The canonical metric set for one window of trading history.
///
/// Every field is finite: degenerate ratios are resolved to their documented fallback and
/// any remaining NaN or infinity is reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceStats {
    // I. Returns
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub elapsed_years: f64,

    // II. Risk-Adjusted Ratios
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub omega_ratio: f64,

    // III. Risk
    pub max_drawdown_pct: f64,
    pub max_drawdown_usd: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub mean_daily_return: f64,
    pub std_daily_return: f64,
    pub downside_deviation: f64,

    // IV. Day-Level Statistics
    pub total_days: usize,
    pub winning_days: usize,
    pub losing_days: usize,
    pub win_rate_pct: f64,
    pub best_day: f64,
    pub worst_day: f64,

    // V. Trade-Level Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub trade_win_rate_pct: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub total_commission: f64,
}

impl PerformanceStats {
    /// Replaces every non-finite value with zero.
    pub(crate) fn normalized(mut self) -> Self {
        for value in [
            &mut self.initial_equity,
            &mut self.final_equity,
            &mut self.total_pnl,
            &mut self.total_return_pct,
            &mut self.annualized_return_pct,
            &mut self.elapsed_years,
            &mut self.sharpe_ratio,
            &mut self.sortino_ratio,
            &mut self.calmar_ratio,
            &mut self.omega_ratio,
            &mut self.max_drawdown_pct,
            &mut self.max_drawdown_usd,
            &mut self.var_95,
            &mut self.cvar_95,
            &mut self.mean_daily_return,
            &mut self.std_daily_return,
            &mut self.downside_deviation,
            &mut self.win_rate_pct,
            &mut self.best_day,
            &mut self.worst_day,
            &mut self.trade_win_rate_pct,
            &mut self.gross_profit,
            &mut self.gross_loss,
            &mut self.profit_factor,
            &mut self.average_win,
            &mut self.average_loss,
            &mut self.total_commission,
        ] {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        self
    }

    /// True when no field holds NaN or an infinity.
    pub fn is_finite(&self) -> bool {
        self.clone().normalized() == *self
    }
}

/// Statistics for one emitted period window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub period: Period,
    pub stats: PerformanceStats,
}

/// Everything the engine produces for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub overall: PerformanceStats,
    pub periods: Vec<PeriodStats>,
    pub equity_curve: Vec<EquityPoint>,
    pub cash_flows: Vec<CashFlow>,
    pub daily: Vec<DailyRecord>,
    pub drawdowns: Vec<DrawdownEvent>,
    pub pnl_distribution: Vec<DistributionBin>,
    pub drawdown_distribution: Vec<DistributionBin>,
}

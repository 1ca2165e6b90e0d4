//! The statistics engine: a pure function from a window's daily series to
//! `PerformanceStats`.
//!
//! Returns are population statistics over daily returns with a zero risk-free rate and no
//! annualization of the ratios themselves. Degenerate denominators never surface as NaN or
//! infinity; see [`Ratio`].

use crate::report::PerformanceStats;
use core_types::{CashFlow, DailyRecord};

const DAYS_PER_YEAR: f64 = 365.25;
const VAR_TAIL: f64 = 0.05;

/// Below this a dispersion measure is rounding noise and is treated as zero.
const NEGLIGIBLE_DISPERSION: f64 = 1e-10;

/// The outcome of a ratio whose denominator may vanish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Finite(f64),
    /// Positive numerator over a zero denominator.
    UnboundedPositive,
    /// Nothing meaningful to report (e.g. zero over zero).
    Undefined,
}

impl Ratio {
    /// Divides, deciding the zero-denominator case with `on_zero`.
    pub fn divide(numerator: f64, denominator: f64, on_zero: impl FnOnce() -> Ratio) -> Self {
        if denominator == 0.0 {
            on_zero()
        } else {
            Ratio::Finite(numerator / denominator)
        }
    }

    /// `UnboundedPositive` for a positive numerator, `Undefined` otherwise.
    pub fn unbounded_if_positive(numerator: f64) -> Self {
        if numerator > 0.0 {
            Ratio::UnboundedPositive
        } else {
            Ratio::Undefined
        }
    }

    /// Collapses the outcome to a reportable number.
    pub fn resolve(self, unbounded: f64, undefined: f64) -> f64 {
        match self {
            Ratio::Finite(value) if value.is_finite() => value,
            Ratio::Finite(_) | Ratio::Undefined => undefined,
            Ratio::UnboundedPositive => unbounded,
        }
    }
}

/// The inputs of one statistics window.
#[derive(Debug, Clone, Default)]
pub struct StatsInput<'a> {
    /// Daily returns as fractions of the day's opening equity.
    pub daily_returns: Vec<f64>,
    /// Daily net P&L in account currency.
    pub daily_pnl: Vec<f64>,
    /// Closing equity of each day.
    pub daily_equity: Vec<f64>,
    pub elapsed_years: f64,
    pub initial_capital: f64,
    pub final_equity: f64,
    /// The window's trade cash flows, for the trade-level fields.
    pub trades: &'a [CashFlow],
}

impl<'a> StatsInput<'a> {
    /// Builds the input for a window from its daily records and trade flows.
    ///
    /// The window spans the inclusive calendar days from its first to its last record.
    pub fn from_days(days: &[DailyRecord], trades: &'a [CashFlow]) -> Self {
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Self {
                trades,
                ..Self::default()
            };
        };

        let span_days = (last.date - first.date).num_days() + 1;

        Self {
            daily_returns: days.iter().map(|d| d.daily_return).collect(),
            daily_pnl: days.iter().map(|d| d.pnl).collect(),
            daily_equity: days.iter().map(|d| d.end_equity).collect(),
            elapsed_years: span_days as f64 / DAYS_PER_YEAR,
            initial_capital: first.start_equity,
            final_equity: last.end_equity,
            trades,
        }
    }
}

/// Computes the full metric set for one window.
pub fn compute(input: &StatsInput<'_>) -> PerformanceStats {
    let returns = &input.daily_returns;

    let mean_return = mean(returns);
    let std_return = zero_if_negligible(population_std(returns, mean_return));
    let downside = zero_if_negligible(downside_deviation(returns));

    let total_return_pct = if input.initial_capital > 0.0 {
        (input.final_equity - input.initial_capital) / input.initial_capital * 100.0
    } else {
        0.0
    };
    let annualized_return_pct =
        annualized_return(input.initial_capital, input.final_equity, input.elapsed_years);
    let (max_drawdown_pct, max_drawdown_usd) =
        max_drawdown(input.initial_capital, &input.daily_equity);

    let sharpe_ratio =
        Ratio::divide(mean_return, std_return, || Ratio::Undefined).resolve(0.0, 0.0);
    let sortino_ratio = Ratio::divide(mean_return, downside, || {
        Ratio::unbounded_if_positive(mean_return)
    })
    .resolve(0.0, 0.0);
    let calmar_ratio = Ratio::divide(annualized_return_pct, max_drawdown_pct, || {
        Ratio::unbounded_if_positive(total_return_pct)
    })
    .resolve(0.0, 0.0);

    let gains: f64 = input.daily_pnl.iter().filter(|p| **p > 0.0).sum();
    let losses: f64 = input.daily_pnl.iter().filter(|p| **p < 0.0).sum::<f64>().abs();
    let omega_ratio =
        Ratio::divide(gains, losses, || Ratio::unbounded_if_positive(gains)).resolve(0.0, 1.0);

    let (var_95, cvar_95) = value_at_risk(&input.daily_pnl);

    let total_days = input.daily_pnl.len();
    let winning_days = input.daily_pnl.iter().filter(|p| **p > 0.0).count();
    let losing_days = input.daily_pnl.iter().filter(|p| **p < 0.0).count();

    let mut stats = PerformanceStats {
        initial_equity: input.initial_capital,
        final_equity: input.final_equity,
        total_pnl: input.final_equity - input.initial_capital,
        total_return_pct,
        annualized_return_pct,
        elapsed_years: input.elapsed_years,
        sharpe_ratio,
        sortino_ratio,
        calmar_ratio,
        omega_ratio,
        max_drawdown_pct,
        max_drawdown_usd,
        var_95,
        cvar_95,
        mean_daily_return: mean_return,
        std_daily_return: std_return,
        downside_deviation: downside,
        total_days,
        winning_days,
        losing_days,
        win_rate_pct: percentage(winning_days, total_days),
        best_day: input.daily_pnl.iter().copied().fold(f64::NAN, f64::max),
        worst_day: input.daily_pnl.iter().copied().fold(f64::NAN, f64::min),
        ..PerformanceStats::default()
    };
    apply_trade_stats(input.trades, &mut stats);

    stats.normalized()
}

/// Trade-level profitability figures from net cash flows.
fn apply_trade_stats(trades: &[CashFlow], stats: &mut PerformanceStats) {
    stats.total_trades = trades.len();

    for trade in trades {
        if trade.net_pnl > 0.0 {
            stats.gross_profit += trade.net_pnl;
            stats.winning_trades += 1;
        } else if trade.net_pnl < 0.0 {
            stats.gross_loss += trade.net_pnl.abs();
            stats.losing_trades += 1;
        }
        stats.total_commission += trade.commission;
    }

    stats.trade_win_rate_pct = percentage(stats.winning_trades, stats.total_trades);
    stats.profit_factor = Ratio::divide(stats.gross_profit, stats.gross_loss, || {
        Ratio::unbounded_if_positive(stats.gross_profit)
    })
    .resolve(0.0, 0.0);

    if stats.winning_trades > 0 {
        stats.average_win = stats.gross_profit / stats.winning_trades as f64;
    }
    if stats.losing_trades > 0 {
        stats.average_loss = stats.gross_loss / stats.losing_trades as f64;
    }
}

pub(crate) fn is_negligible(value: f64) -> bool {
    value.abs() < NEGLIGIBLE_DISPERSION
}

fn zero_if_negligible(value: f64) -> f64 {
    if is_negligible(value) { 0.0 } else { value }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Root mean square of the negative returns only, over their own count.
fn downside_deviation(returns: &[f64]) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.is_empty() {
        return 0.0;
    }
    (negatives.iter().map(|r| r * r).sum::<f64>() / negatives.len() as f64).sqrt()
}

/// Compound annual growth rate in percent.
pub fn annualized_return(initial_capital: f64, final_equity: f64, elapsed_years: f64) -> f64 {
    if elapsed_years <= 0.0 || initial_capital <= 0.0 {
        return 0.0;
    }
    if final_equity <= 0.0 {
        return -100.0;
    }
    ((final_equity / initial_capital).powf(1.0 / elapsed_years) - 1.0) * 100.0
}

/// Largest peak-to-trough decline as (percent of the peak, dollars), scanning the equity
/// series once with the running peak seeded at the starting capital.
pub fn max_drawdown(initial_capital: f64, equity: &[f64]) -> (f64, f64) {
    let mut peak = initial_capital;
    let mut max_pct = 0.0_f64;
    let mut max_usd = 0.0_f64;

    for &value in equity {
        peak = peak.max(value);
        let drop = peak - value;
        max_usd = max_usd.max(drop);
        if peak > 0.0 {
            max_pct = max_pct.max(drop / peak * 100.0);
        }
    }

    (max_pct, max_usd)
}

/// Historical 95% VaR and CVaR of daily P&L, as signed dollar amounts.
pub fn value_at_risk(daily_pnl: &[f64]) -> (f64, f64) {
    if daily_pnl.is_empty() {
        return (0.0, 0.0);
    }

    let mut sorted = daily_pnl.to_vec();
    sorted.sort_by(f64::total_cmp);

    let index = (sorted.len() as f64 * VAR_TAIL).floor() as usize;
    let var = sorted[index];
    let cvar = mean(&sorted[..=index]);

    (var, cvar)
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

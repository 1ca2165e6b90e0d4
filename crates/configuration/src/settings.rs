use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;

/// How the dollar stake of each trade is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PositionSizeType {
    /// A constant dollar stake per trade.
    #[default]
    Fixed,
    /// A percentage of the equity at the time of the trade (compounding).
    Percentage,
}

/// The unit of a statistics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PeriodUnit {
    Day,
    Week,
    #[default]
    Month,
}

impl PeriodUnit {
    /// Length of one unit in milliseconds.
    ///
    /// A month is a flat 30 days, not a calendar month, so long multi-month windows
    /// drift against the calendar.
    pub fn millis(&self) -> i64 {
        match self {
            PeriodUnit::Day => MS_PER_DAY,
            PeriodUnit::Week => 7 * MS_PER_DAY,
            PeriodUnit::Month => 30 * MS_PER_DAY,
        }
    }
}

/// The per-run context handed to every stage of the analytics pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Starting account equity. Must be positive.
    pub initial_capital: f64,
    pub position_size_type: PositionSizeType,
    /// Dollar stake for `fixed`, percent of equity (e.g. `10.0`) for `percentage`.
    pub position_size: f64,
    /// Round-trip commission as a fraction of the stake, in `[0, 1)`.
    pub commission_rate: f64,
    pub period_unit: PeriodUnit,
    /// Number of `period_unit`s per statistics window.
    pub period_length: u32,
    /// Histogram bin width in standard deviations.
    pub bin_size_in_std_dev: f64,
    /// How many standard deviations either side of the mean a rendered histogram shows.
    pub distribution_display_range_sd: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            position_size_type: PositionSizeType::Fixed,
            position_size: 1_000.0,
            commission_rate: 0.0,
            period_unit: PeriodUnit::Month,
            period_length: 1,
            bin_size_in_std_dev: 0.5,
            distribution_display_range_sd: 3.0,
        }
    }
}

impl AnalysisConfig {
    /// Length of one statistics window in milliseconds, saturating at `i64::MAX`.
    pub fn period_length_ms(&self) -> i64 {
        self.period_unit
            .millis()
            .saturating_mul(i64::from(self.period_length))
    }

    /// Checks every field against its documented domain.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(format!(
                "initial_capital must be a positive number, got {}",
                self.initial_capital
            ));
        }
        if !(self.position_size.is_finite() && self.position_size > 0.0) {
            return Err(format!(
                "position_size must be a positive number, got {}",
                self.position_size
            ));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            ));
        }
        if self.period_length == 0 {
            return Err("period_length must be at least 1".to_string());
        }
        if !(self.bin_size_in_std_dev.is_finite() && self.bin_size_in_std_dev > 0.0) {
            return Err(format!(
                "bin_size_in_std_dev must be a positive number, got {}",
                self.bin_size_in_std_dev
            ));
        }
        if !(self.distribution_display_range_sd.is_finite()
            && self.distribution_display_range_sd > 0.0)
        {
            return Err(format!(
                "distribution_display_range_sd must be a positive number, got {}",
                self.distribution_display_range_sd
            ));
        }
        Ok(())
    }
}

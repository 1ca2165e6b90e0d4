//! # Trade Performance Analytics Engine
//!
//! This crate turns a chronological log of closed trades into a performance analysis:
//! overall and per-period risk/return statistics, an equity curve, drawdown events and
//! value/loss distributions.
//!
//! ## Pipeline
//!
//! Stages run strictly in order, each consuming the complete output of the previous one:
//!
//! 1. `normalizer` validates and time-orders raw trade rows.
//! 2. `sizing` converts each trade into a net cash flow under the configured sizing policy.
//! 3. `daily` folds cash flows into one equity record per calendar day.
//! 4. `periods` cuts the history into fixed-length windows; `drawdown` scans daily equity.
//! 5. `stats` computes the metric set per window; `distribution` bins trade P&L and
//!    drawdown depths.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: runs the pipeline for one `AnalysisConfig`.
//! - `AnalysisReport` / `PerformanceStats`: the serializable results.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod daily;
pub mod distribution;
pub mod drawdown;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod periods;
pub mod report;
pub mod sizing;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use distribution::DistributionBin;
pub use drawdown::{DrawdownEvent, DrawdownSummary};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use periods::Period;
pub use report::{AnalysisReport, PerformanceStats, PeriodStats};
pub use sizing::PositionSizer;
pub use stats::{Ratio, StatsInput};

use crate::stats::{is_negligible, mean, population_std};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of bins; narrower requested widths are coarsened to fit.
pub const MAX_BINS: usize = 1_000;

/// One histogram bucket of a standard-deviation-scaled distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub bin_center: f64,
    pub count: usize,
    /// Share of the whole sample, in percent.
    pub percentage: f64,
    /// Bin centre in standard deviations from the sample mean.
    pub std_dev_position: f64,
}

/// Builds a histogram whose bins are `bin_size_sd` standard deviations wide.
///
/// Bins span the sample from the floored minimum to the ceiled maximum position (both
/// in multiples of the bin width), empty bins included. A sample with no spread yields a
/// single bin on its mean; an empty sample yields no bins.
pub fn build(sample: &[f64], bin_size_sd: f64) -> Vec<DistributionBin> {
    if sample.is_empty() {
        return Vec::new();
    }

    let total = sample.len();
    let mu = mean(sample);
    let sigma = population_std(sample, mu);

    if !sigma.is_finite() || is_negligible(sigma) || !(bin_size_sd > 0.0) {
        return vec![DistributionBin {
            bin_start: mu,
            bin_end: mu,
            bin_center: mu,
            count: total,
            percentage: 100.0,
            std_dev_position: 0.0,
        }];
    }

    let position = |value: f64| (value - mu) / sigma;
    let (min, max) = sample
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    // Floor and ceil can each add one bin beyond the span.
    let span = position(max) - position(min);
    let min_width = span / (MAX_BINS - 2) as f64;
    let bin_size_sd = if bin_size_sd < min_width {
        tracing::debug!(requested = bin_size_sd, used = min_width, "Coarsening histogram bins");
        min_width
    } else {
        bin_size_sd
    };

    let first_position = (position(min) / bin_size_sd).floor() * bin_size_sd;
    let last_position = (position(max) / bin_size_sd).ceil() * bin_size_sd;
    let bin_count = (((last_position - first_position) / bin_size_sd).round() as usize)
        .clamp(1, MAX_BINS);

    let mut counts = vec![0usize; bin_count];
    for &value in sample {
        let offset = ((position(value) - first_position) / bin_size_sd).floor();
        let index = if offset <= 0.0 {
            0
        } else {
            (offset as usize).min(bin_count - 1)
        };
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start_position = first_position + i as f64 * bin_size_sd;
            let center_position = start_position + bin_size_sd / 2.0;
            DistributionBin {
                bin_start: mu + start_position * sigma,
                bin_end: mu + (start_position + bin_size_sd) * sigma,
                bin_center: mu + center_position * sigma,
                count,
                percentage: count as f64 / total as f64 * 100.0,
                std_dev_position: center_position,
            }
        })
        .collect()
}

/// Restricts bins to centres within `range_sd` standard deviations of the mean.
///
/// The counts of clipped tail bins are folded into the outermost kept bin on their side,
/// so the totals still describe the whole sample.
pub fn clip_to_display_range(bins: &[DistributionBin], range_sd: f64) -> Vec<DistributionBin> {
    let in_range = |b: &DistributionBin| b.std_dev_position.abs() <= range_sd;
    let Some(first_kept) = bins.iter().position(in_range) else {
        return bins.to_vec();
    };
    let last_kept = bins.iter().rposition(in_range).unwrap_or(first_kept);

    let mut kept = bins[first_kept..=last_kept].to_vec();
    let fold = |target: &mut DistributionBin, tail: &[DistributionBin]| {
        target.count += tail.iter().map(|b| b.count).sum::<usize>();
        target.percentage += tail.iter().map(|b| b.percentage).sum::<f64>();
    };

    if let Some(lowest) = kept.first_mut() {
        fold(lowest, &bins[..first_kept]);
    }
    if let Some(highest) = kept.last_mut() {
        fold(highest, &bins[last_kept + 1..]);
    }
    kept
}

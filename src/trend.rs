use crate::aggregate::PeriodBucket;
use serde::{Deserialize, Serialize};

/// Minimum history length for fitting a slope at all. Below this the
/// average-fallback policy produces a flat model.
pub const MIN_TREND_PERIODS: usize = 2;

/// Minimum history length for a meaningful residual dispersion. With
/// exactly two points the fit is exact and the interval collapses, so
/// anything shorter than this is reported as degraded.
pub const MIN_RESIDUAL_PERIODS: usize = 3;

// Slopes below this fraction of the series mean count as noise.
const DIRECTION_EPSILON_RATIO: f64 = 1e-3;
const DIRECTION_EPSILON_FLOOR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Linear trend fit over bucket index (0..n-1) against emission totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    pub direction: TrendDirection,

    /// True when the history was too short for both a slope and a
    /// residual dispersion estimate; callers branch on this instead of
    /// re-deriving "was there enough data" from series length.
    pub degraded: bool,
}

impl TrendModel {
    /// Trend value at a given period index.
    pub fn fitted(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// Ordinary least-squares fit of `total_emissions` against period index.
///
/// Fewer than [`MIN_TREND_PERIODS`] periods of history yield a
/// zero-slope model whose intercept is the single available value (or
/// the series mean), with `direction = Stable`. This is the single
/// average-fallback policy of the whole pipeline: sparse data degrades,
/// it never fails.
pub fn fit_trend(buckets: &[PeriodBucket]) -> TrendModel {
    let n = buckets.len();
    let degraded = n < MIN_RESIDUAL_PERIODS;

    if n == 0 {
        return TrendModel {
            slope: 0.0,
            intercept: 0.0,
            direction: TrendDirection::Stable,
            degraded,
        };
    }

    let mean = buckets.iter().map(|b| b.total_emissions).sum::<f64>() / n as f64;

    if n < MIN_TREND_PERIODS {
        return TrendModel {
            slope: 0.0,
            intercept: mean,
            direction: TrendDirection::Stable,
            degraded,
        };
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, bucket) in buckets.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (bucket.total_emissions - mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        // Variance-free index axis cannot happen for n >= 2, but the
        // fallback keeps the contract total: degrade, never fail.
        return TrendModel {
            slope: 0.0,
            intercept: mean,
            direction: TrendDirection::Stable,
            degraded: true,
        };
    }

    let slope = numerator / denominator;
    let intercept = mean - slope * x_mean;

    let epsilon = (mean.abs() * DIRECTION_EPSILON_RATIO).max(DIRECTION_EPSILON_FLOOR);
    let direction = if slope > epsilon {
        TrendDirection::Increasing
    } else if slope < -epsilon {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    TrendModel {
        slope,
        intercept,
        direction,
        degraded,
    }
}

/// Standard deviation of `(actual - trend_fit)` over the training
/// series. One scalar for the whole horizon: the interval width does
/// not grow with forecast distance (documented design limitation).
pub fn residual_std_error(buckets: &[PeriodBucket], trend: &TrendModel) -> f64 {
    if buckets.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let residual = bucket.total_emissions - trend.fitted(i);
            residual * residual
        })
        .sum();

    (sum_sq / buckets.len() as f64).sqrt()
}

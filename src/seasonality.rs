use crate::aggregate::PeriodBucket;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Minimum monthly history needed before seasonal factors are computed.
pub const MIN_SEASONALITY_PERIODS: usize = 12;

/// Multiplicative per-calendar-month adjustment factors.
///
/// Each month's factor is the mean of that calendar month's observed
/// values divided by the global series mean; months never observed stay
/// at the neutral 1.0. The twelve factors are *not* re-normalized to
/// average exactly 1.0 — the raw table is exposed so a consumer that
/// needs normalization can apply its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfile {
    factors: [f64; 12],
    applied: bool,
}

impl SeasonalProfile {
    /// Identity profile: every month's factor is 1.0.
    pub fn neutral() -> Self {
        Self {
            factors: [1.0; 12],
            applied: false,
        }
    }

    /// Derives factors from a monthly series. Falls back to the neutral
    /// profile when the history spans fewer than
    /// [`MIN_SEASONALITY_PERIODS`] buckets or averages to zero.
    ///
    /// Quarterly forecasts reuse the monthly profile computed here;
    /// seasonality is never derived per quarter.
    pub fn from_monthly_series(buckets: &[PeriodBucket]) -> Self {
        if buckets.len() < MIN_SEASONALITY_PERIODS {
            return Self::neutral();
        }

        let global_mean =
            buckets.iter().map(|b| b.total_emissions).sum::<f64>() / buckets.len() as f64;
        if global_mean <= 0.0 {
            return Self::neutral();
        }

        let mut sums = [0.0f64; 12];
        let mut counts = [0usize; 12];
        for bucket in buckets {
            let idx = bucket.period_start.month0() as usize;
            sums[idx] += bucket.total_emissions;
            counts[idx] += 1;
        }

        let mut factors = [1.0f64; 12];
        for idx in 0..12 {
            if counts[idx] > 0 {
                let month_mean = sums[idx] / counts[idx] as f64;
                factors[idx] = month_mean / global_mean;
            }
        }

        Self {
            factors,
            applied: true,
        }
    }

    /// Factor for a calendar month (1-12).
    pub fn factor_for_month(&self, month: u32) -> f64 {
        self.factors[(month - 1) as usize]
    }

    /// The raw 12-slot factor table, January first.
    pub fn factors(&self) -> &[f64; 12] {
        &self.factors
    }

    /// Whether real factors were derived (false means identity fallback).
    pub fn applied(&self) -> bool {
        self.applied
    }
}

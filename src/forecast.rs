use crate::aggregate::{aggregate_monthly, rollup_quarterly, PeriodBucket};
use crate::error::{ForecastError, Result};
use crate::schema::{Category, EmissionRecord, ForecastRequest, Frequency};
use crate::seasonality::SeasonalProfile;
use crate::trend::{fit_trend, residual_std_error, TrendDirection, TrendModel};
use crate::utils::{add_months, month_start, next_month_start, quarter_start};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One projected period with symmetric confidence bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_start: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Historical series, projection and fitted trend for one entity
/// (the overall series or a single category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesForecast {
    pub historical: Vec<PeriodBucket>,
    pub forecast: Vec<ForecastPoint>,
    pub trend: TrendModel,
    pub degraded: bool,
    pub seasonality_applied: bool,
}

/// Headline numbers for the overall series, in the requested cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub avg_historical: f64,
    pub avg_forecast: f64,
    pub total_forecast: f64,
    pub change_percentage: f64,
    pub trend_direction: TrendDirection,
}

/// Full output of a forecast run. Built fresh per invocation; the core
/// persists nothing and stamps nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub frequency: Frequency,
    pub periods: usize,
    pub overall: SeriesForecast,
    pub by_category: BTreeMap<Category, SeriesForecast>,
    pub metrics: ForecastMetrics,
    pub degraded: bool,
}

/// Projects one series `periods` periods ahead at the requested
/// cadence.
///
/// The projection is always computed monthly — trend fit, seasonal
/// factors and residual dispersion all come from the monthly history —
/// and quarterly output is the calendar-quarter rollup of the monthly
/// projection (historical buckets and bounds summed alike). Bounds use
/// one residual-std scalar for the entire horizon; intervals do not
/// widen with forecast distance (documented design limitation). Lower
/// bounds floor at zero, as do point estimates: emissions cannot be
/// negative.
pub fn project_series(
    monthly_history: &[PeriodBucket],
    frequency: Frequency,
    periods: usize,
    origin: Option<NaiveDate>,
) -> Result<SeriesForecast> {
    if periods == 0 {
        return Err(ForecastError::InvalidHorizon(
            "periods must be > 0".to_string(),
        ));
    }

    let months = periods * frequency.months_per_period() as usize;

    let trend = fit_trend(monthly_history);
    let profile = SeasonalProfile::from_monthly_series(monthly_history);
    let sigma = residual_std_error(monthly_history, &trend);

    let first_period = match monthly_history.last() {
        Some(last) => next_month_start(last.period_start),
        None => match origin {
            Some(date) => month_start(date),
            None => {
                return Err(ForecastError::EmptyHistory(
                    "record set has no history and the request carries no origin".to_string(),
                ))
            }
        },
    };

    let mut forecast = Vec::with_capacity(months);
    for offset in 0..months {
        let period_start = add_months(first_period, offset as u32);
        let index = monthly_history.len() + offset;

        let trend_value = trend.fitted(index);
        let seasonal_factor = profile.factor_for_month(period_start.month());
        let point_estimate = (trend_value * seasonal_factor).max(0.0);

        forecast.push(ForecastPoint {
            period_start,
            point_estimate,
            lower_bound: (point_estimate - sigma).max(0.0),
            upper_bound: point_estimate + sigma,
        });
    }

    let (historical, forecast) = match frequency {
        Frequency::Monthly => (monthly_history.to_vec(), forecast),
        Frequency::Quarterly => (
            rollup_quarterly(monthly_history),
            rollup_forecast_quarterly(&forecast),
        ),
    };

    Ok(SeriesForecast {
        historical,
        forecast,
        degraded: trend.degraded,
        seasonality_applied: profile.applied(),
        trend,
    })
}

/// Generates the overall and per-category forecasts for a record set.
pub fn generate_forecast(
    records: &[EmissionRecord],
    request: &ForecastRequest,
) -> Result<ForecastResult> {
    let monthly = aggregate_monthly(records, request.categories.as_deref());

    let overall = project_series(
        &monthly.overall,
        request.frequency,
        request.periods,
        request.origin,
    )?;

    let mut by_category = BTreeMap::new();
    for (category, buckets) in &monthly.by_category {
        let series = project_series(buckets, request.frequency, request.periods, request.origin)?;
        by_category.insert(*category, series);
    }

    let metrics = calculate_metrics(&overall);
    let degraded = overall.degraded;

    Ok(ForecastResult {
        frequency: request.frequency,
        periods: request.periods,
        overall,
        by_category,
        metrics,
        degraded,
    })
}

fn rollup_forecast_quarterly(monthly: &[ForecastPoint]) -> Vec<ForecastPoint> {
    let mut quarters: BTreeMap<NaiveDate, (f64, f64, f64)> = BTreeMap::new();

    for point in monthly {
        let entry = quarters
            .entry(quarter_start(point.period_start))
            .or_insert((0.0, 0.0, 0.0));
        entry.0 += point.point_estimate;
        entry.1 += point.lower_bound;
        entry.2 += point.upper_bound;
    }

    quarters
        .into_iter()
        .map(|(period_start, (point_estimate, lower_bound, upper_bound))| ForecastPoint {
            period_start,
            point_estimate,
            lower_bound,
            upper_bound,
        })
        .collect()
}

fn calculate_metrics(overall: &SeriesForecast) -> ForecastMetrics {
    let avg_historical = if overall.historical.is_empty() {
        0.0
    } else {
        overall
            .historical
            .iter()
            .map(|b| b.total_emissions)
            .sum::<f64>()
            / overall.historical.len() as f64
    };

    let total_forecast: f64 = overall.forecast.iter().map(|p| p.point_estimate).sum();
    let avg_forecast = if overall.forecast.is_empty() {
        0.0
    } else {
        total_forecast / overall.forecast.len() as f64
    };

    let change_percentage = if avg_historical > 0.0 {
        (avg_forecast - avg_historical) / avg_historical * 100.0
    } else {
        0.0
    };

    ForecastMetrics {
        avg_historical,
        avg_forecast,
        total_forecast,
        change_percentage,
        trend_direction: overall.trend.direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly_series(start_year: i32, start_month: u32, values: &[f64]) -> Vec<PeriodBucket> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let total = (start_month - 1) as usize + i;
                PeriodBucket {
                    period_start: NaiveDate::from_ymd_opt(
                        start_year + (total / 12) as i32,
                        (total % 12) as u32 + 1,
                        1,
                    )
                    .unwrap(),
                    total_emissions: v,
                }
            })
            .collect()
    }

    #[test]
    fn test_constant_series_projects_flat() {
        let history = monthly_series(2023, 1, &[100.0; 12]);
        let series = project_series(&history, Frequency::Monthly, 3, None).unwrap();

        assert_eq!(series.forecast.len(), 3);
        assert!(!series.degraded);
        assert!(series.seasonality_applied);
        for point in &series.forecast {
            assert!((point.point_estimate - 100.0).abs() < 1e-6);
        }
        assert_eq!(
            series.forecast[0].period_start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_bounds_ordering_holds() {
        let history = monthly_series(2023, 1, &[80.0, 120.0, 95.0, 110.0, 70.0, 130.0]);
        let series = project_series(&history, Frequency::Monthly, 6, None).unwrap();

        for point in &series.forecast {
            assert!(point.lower_bound <= point.point_estimate);
            assert!(point.point_estimate <= point.upper_bound);
            assert!(point.lower_bound >= 0.0);
        }
    }

    #[test]
    fn test_steep_decline_clamps_at_zero() {
        let history = monthly_series(2023, 1, &[300.0, 200.0, 100.0, 50.0, 10.0]);
        let series = project_series(&history, Frequency::Monthly, 6, None).unwrap();

        let last = series.forecast.last().unwrap();
        assert!(last.point_estimate >= 0.0);
        assert!(last.lower_bound >= 0.0);
        assert!(last.lower_bound <= last.upper_bound);
    }

    #[test]
    fn test_single_point_degrades_to_constant() {
        let history = monthly_series(2023, 6, &[42.0]);
        let series = project_series(&history, Frequency::Monthly, 4, None).unwrap();

        assert!(series.degraded);
        for point in &series.forecast {
            assert!((point.point_estimate - 42.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_history_needs_origin() {
        let err = project_series(&[], Frequency::Monthly, 3, None);
        assert!(err.is_err());

        let origin = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let series = project_series(&[], Frequency::Monthly, 3, Some(origin)).unwrap();
        assert!(series.degraded);
        assert_eq!(
            series.forecast[0].period_start,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        for point in &series.forecast {
            assert_eq!(point.point_estimate, 0.0);
        }
    }

    #[test]
    fn test_zero_periods_rejected() {
        let history = monthly_series(2023, 1, &[10.0, 20.0, 30.0]);
        let result = project_series(&history, Frequency::Monthly, 0, None);
        assert!(matches!(result, Err(ForecastError::InvalidHorizon(_))));
    }

    #[test]
    fn test_quarterly_projection_rolls_up_months() {
        // History ends in December, so the projection starts on a
        // quarter boundary and two quarters cover exactly six months.
        let history = monthly_series(2023, 1, &[100.0; 12]);
        let series = project_series(&history, Frequency::Quarterly, 2, None).unwrap();

        assert_eq!(series.historical.len(), 4);
        assert_eq!(series.forecast.len(), 2);
        for point in &series.forecast {
            assert!((point.point_estimate - 300.0).abs() < 1e-6);
            assert!(point.lower_bound <= point.point_estimate);
            assert!(point.point_estimate <= point.upper_bound);
        }
        assert_eq!(
            series.forecast[0].period_start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_metrics_change_percentage() {
        let history = monthly_series(2023, 1, &[100.0; 12]);
        let overall = project_series(&history, Frequency::Monthly, 3, None).unwrap();
        let metrics = calculate_metrics(&overall);

        assert!((metrics.avg_historical - 100.0).abs() < 1e-6);
        assert!((metrics.avg_forecast - 100.0).abs() < 1e-6);
        assert!(metrics.change_percentage.abs() < 1.0);
        assert_eq!(metrics.trend_direction, TrendDirection::Stable);
    }
}

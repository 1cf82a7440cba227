//! # Carbon Forecast
//!
//! A library for turning a history of categorized, dated emission
//! records into forward-looking projections with uncertainty bounds,
//! and for reconciling those projections against per-category carbon
//! budgets.
//!
//! ## Core Concepts
//!
//! - **Emission records**: invoice lines already categorized upstream,
//!   valued in kg CO2e (the single canonical unit everywhere).
//! - **Period buckets**: contiguous monthly or quarterly totals;
//!   periods with no records appear with a zero total, never a gap.
//! - **Trend + seasonality**: an OLS fit over period index, adjusted by
//!   multiplicative per-calendar-month factors when at least a year of
//!   monthly history exists.
//! - **Degraded forecasts**: sparse history never fails — the average
//!   fallback produces a flat projection and the result is flagged
//!   `degraded` so callers can branch on it.
//! - **Budget compliance**: validated per-category budgets, severity
//!   bands over the deviation percentage, alerts and templated
//!   reduction recommendations.
//!
//! The whole pipeline is a pure, synchronous batch computation: no
//! I/O besides the budget CSV loader, no clock, no shared state, and
//! identical inputs always produce identical output. A failed budget
//! load never has to abort forecasting — generate the budget-less
//! [`ForecastResult`] and skip the comparison.
//!
//! ## Example
//!
//! ```rust,ignore
//! use carbon_forecast::*;
//! use chrono::NaiveDate;
//!
//! let records = vec![
//!     EmissionRecord::new(
//!         NaiveDate::from_ymd_opt(2023, 1, 12).unwrap(),
//!         Category::Energy,
//!         420.0,
//!     )?,
//!     // ... one per enriched invoice line
//! ];
//!
//! let request = ForecastRequest::new(6, Frequency::Monthly);
//! let budget = BudgetModel::from_path("budget.csv")?;
//!
//! let report = forecast_with_budget(&records, &request, &budget)?;
//! println!("{:?}", report.comparison.summary.overall_status);
//! ```

pub mod aggregate;
pub mod budget;
pub mod compare;
pub mod error;
pub mod forecast;
pub mod recommend;
pub mod schema;
pub mod seasonality;
pub mod trend;
pub mod utils;

pub use aggregate::{aggregate_monthly, aggregate_records, AggregatedSeries, PeriodBucket};
pub use budget::{BudgetCadence, BudgetModel, BudgetShare, BudgetSummary};
pub use compare::{
    compare, Alert, ComparisonResult, ComparisonSummary, EntityComparison, PeriodComparison,
    Severity,
};
pub use error::{ForecastError, Result};
pub use forecast::{
    generate_forecast, project_series, ForecastMetrics, ForecastPoint, ForecastResult,
    SeriesForecast,
};
pub use recommend::{recommend, Priority, Recommendation};
pub use schema::{Category, EmissionRecord, ForecastRequest, Frequency};
pub use seasonality::SeasonalProfile;
pub use trend::{fit_trend, TrendDirection, TrendModel};

use log::{debug, info};

/// Forecast plus its budget reconciliation and the derived
/// recommendations, produced in one pass.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ForecastReport {
    pub forecast: ForecastResult,
    pub comparison: ComparisonResult,
    pub recommendations: Vec<Recommendation>,
}

pub struct EmissionForecaster;

impl EmissionForecaster {
    pub fn forecast(
        records: &[EmissionRecord],
        request: &ForecastRequest,
    ) -> Result<ForecastResult> {
        info!(
            "Generating {:?} forecast: {} periods over {} records",
            request.frequency,
            request.periods,
            records.len()
        );

        let result = forecast::generate_forecast(records, request)?;

        if result.degraded {
            debug!(
                "Degraded forecast: only {} historical period(s) available",
                result.overall.historical.len()
            );
        }

        Ok(result)
    }

    pub fn forecast_with_budget(
        records: &[EmissionRecord],
        request: &ForecastRequest,
        budget: &BudgetModel,
    ) -> Result<ForecastReport> {
        let forecast = Self::forecast(records, request)?;
        let comparison = compare::compare(&forecast, budget);
        let recommendations = recommend::recommend(&comparison);

        info!(
            "Budget comparison: {} alert(s), overall status {:?}",
            comparison.alerts.len(),
            comparison.summary.overall_status
        );

        Ok(ForecastReport {
            forecast,
            comparison,
            recommendations,
        })
    }
}

pub fn forecast_emissions(
    records: &[EmissionRecord],
    request: &ForecastRequest,
) -> Result<ForecastResult> {
    EmissionForecaster::forecast(records, request)
}

pub fn forecast_with_budget(
    records: &[EmissionRecord],
    request: &ForecastRequest,
    budget: &BudgetModel,
) -> Result<ForecastReport> {
    EmissionForecaster::forecast_with_budget(records, request, budget)
}

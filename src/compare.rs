use crate::budget::BudgetModel;
use crate::forecast::{ForecastResult, SeriesForecast};
use crate::schema::Category;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered alert tier. The derive order is the severity order:
/// on_track < warning < medium < high < critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    OnTrack,
    Warning,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::OnTrack,
        Severity::Warning,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}

/// Severity bands over `difference_pct`, scanned first-match with a
/// strict `>`. Boundary values therefore land in the lower band:
/// exactly 5.0 is `warning`, exactly 20.0 is `high`.
pub const SEVERITY_BANDS: [(f64, Severity); 4] = [
    (20.0, Severity::Critical),
    (10.0, Severity::High),
    (5.0, Severity::Medium),
    (0.0, Severity::Warning),
];

/// Maps a budget-deviation percentage onto its severity band.
pub fn classify(difference_pct: f64) -> Severity {
    for (threshold, severity) in SEVERITY_BANDS {
        if difference_pct > threshold {
            return severity;
        }
    }
    Severity::OnTrack
}

/// One projected period against the per-period budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub period_start: NaiveDate,
    pub forecast: f64,
    pub budget: f64,
    pub difference: f64,
    /// None when the budget is zero (the sentinel stays JSON-safe).
    pub difference_pct: Option<f64>,
    pub status: Severity,
}

/// Forecast-vs-budget reconciliation for one entity (overall or one
/// category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityComparison {
    pub forecast_total: f64,
    pub forecast_avg: f64,
    pub budget: f64,
    pub difference: f64,
    pub difference_pct: Option<f64>,
    pub status: Severity,
    pub periods: Vec<PeriodComparison>,
}

/// One non-on_track entity, with a canonical English message.
/// Localization belongs to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    /// None for the overall series.
    pub category: Option<Category>,
    pub message: String,
    pub difference_pct: Option<f64>,
    pub forecast_avg: f64,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_alerts: usize,
    /// Compared entities per severity, on_track included.
    pub severity_counts: BTreeMap<Severity, usize>,
    pub categories_over_budget: usize,
    pub categories_under_budget: usize,
    /// Worst severity among all compared entities.
    pub overall_status: Severity,
    /// True iff `overall_status` is medium or worse.
    pub requires_action: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub overall: Option<EntityComparison>,
    pub by_category: BTreeMap<Category, EntityComparison>,
    pub alerts: Vec<Alert>,
    pub summary: ComparisonSummary,
}

/// Reconciles a forecast against a budget model.
///
/// Only entities present on both sides are compared: a forecast
/// category without a budget row is excluded, never assumed to have a
/// zero budget. A zero budget against a positive forecast is forced to
/// `critical` with the percentage reported as the None sentinel. Pure
/// function of its inputs: identical inputs yield identical output.
pub fn compare(forecast: &ForecastResult, budget: &BudgetModel) -> ComparisonResult {
    let frequency = forecast.frequency;

    let overall = Some(compare_entity(
        &forecast.overall,
        budget.overall_budget(frequency),
    ));

    let mut by_category = BTreeMap::new();
    for (&category, series) in &forecast.by_category {
        if let Some(category_budget) = budget.category_budget(category, frequency) {
            by_category.insert(category, compare_entity(series, category_budget));
        }
    }

    let alerts = collect_alerts(overall.as_ref(), &by_category);
    let summary = summarize(overall.as_ref(), &by_category, &alerts);

    ComparisonResult {
        overall,
        by_category,
        alerts,
        summary,
    }
}

fn compare_entity(series: &SeriesForecast, budget: f64) -> EntityComparison {
    let forecast_total: f64 = series.forecast.iter().map(|p| p.point_estimate).sum();
    let forecast_avg = if series.forecast.is_empty() {
        0.0
    } else {
        forecast_total / series.forecast.len() as f64
    };

    let difference = forecast_avg - budget;
    let (difference_pct, status) = deviation(forecast_avg, budget);

    let periods = series
        .forecast
        .iter()
        .map(|point| {
            let period_difference = point.point_estimate - budget;
            let (period_pct, period_status) = deviation(point.point_estimate, budget);
            PeriodComparison {
                period_start: point.period_start,
                forecast: point.point_estimate,
                budget,
                difference: period_difference,
                difference_pct: period_pct,
                status: period_status,
            }
        })
        .collect();

    EntityComparison {
        forecast_total,
        forecast_avg,
        budget,
        difference,
        difference_pct,
        status,
        periods,
    }
}

fn deviation(forecast_value: f64, budget: f64) -> (Option<f64>, Severity) {
    if budget == 0.0 {
        let status = if forecast_value > 0.0 {
            Severity::Critical
        } else {
            Severity::OnTrack
        };
        (None, status)
    } else {
        let pct = (forecast_value - budget) / budget * 100.0;
        (Some(pct), classify(pct))
    }
}

fn collect_alerts(
    overall: Option<&EntityComparison>,
    by_category: &BTreeMap<Category, EntityComparison>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(comparison) = overall {
        if comparison.status != Severity::OnTrack {
            alerts.push(make_alert(None, comparison));
        }
    }

    for (&category, comparison) in by_category {
        if comparison.status != Severity::OnTrack {
            alerts.push(make_alert(Some(category), comparison));
        }
    }

    // Worst first; within a severity, the largest overrun first. A
    // zero-budget overrun has no finite percentage and outranks any
    // finite one.
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| {
                let a_pct = a.difference_pct.unwrap_or(f64::INFINITY);
                let b_pct = b.difference_pct.unwrap_or(f64::INFINITY);
                b_pct.partial_cmp(&a_pct).unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    alerts
}

fn make_alert(category: Option<Category>, comparison: &EntityComparison) -> Alert {
    let name = match category {
        Some(category) => category.label(),
        None => "overall emissions",
    };

    let message = match (comparison.status, comparison.difference_pct) {
        (Severity::Critical, Some(pct)) => {
            format!("CRITICAL: {} exceeds budget by {:.1}%", name, pct)
        }
        (Severity::Critical, None) => format!(
            "CRITICAL: {} has a zero budget but a forecast of {:.1} kg CO2e per period",
            name, comparison.forecast_avg
        ),
        (Severity::High, Some(pct)) => {
            format!("ALERT: {} exceeds budget by {:.1}%", name, pct)
        }
        (Severity::Medium, Some(pct)) => {
            format!("Warning: {} exceeds budget by {:.1}%", name, pct)
        }
        (Severity::Warning, Some(pct)) => {
            format!("Watch: {} approaching budget (+{:.1}%)", name, pct)
        }
        (status, _) => format!("{} status: {:?}", name, status),
    };

    Alert {
        severity: comparison.status,
        category,
        message,
        difference_pct: comparison.difference_pct,
        forecast_avg: comparison.forecast_avg,
        budget: comparison.budget,
    }
}

fn summarize(
    overall: Option<&EntityComparison>,
    by_category: &BTreeMap<Category, EntityComparison>,
    alerts: &[Alert],
) -> ComparisonSummary {
    let mut severity_counts: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|&s| (s, 0)).collect();

    let entities = overall.into_iter().chain(by_category.values());
    let mut overall_status = Severity::OnTrack;
    for comparison in entities {
        *severity_counts.get_mut(&comparison.status).unwrap() += 1;
        overall_status = overall_status.max(comparison.status);
    }

    let categories_over_budget = by_category
        .values()
        .filter(|c| c.difference > 0.0)
        .count();
    let categories_under_budget = by_category.len() - categories_over_budget;

    ComparisonSummary {
        total_alerts: alerts.len(),
        severity_counts,
        categories_over_budget,
        categories_under_budget,
        overall_status,
        requires_action: overall_status >= Severity::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::PeriodBucket;
    use crate::budget::BudgetCadence;
    use crate::forecast::ForecastPoint;
    use crate::schema::Frequency;
    use crate::trend::{TrendDirection, TrendModel};

    fn flat_series(avg: f64, periods: usize) -> SeriesForecast {
        let forecast = (0..periods)
            .map(|i| ForecastPoint {
                period_start: NaiveDate::from_ymd_opt(2024, 1 + i as u32, 1).unwrap(),
                point_estimate: avg,
                lower_bound: avg * 0.9,
                upper_bound: avg * 1.1,
            })
            .collect();

        SeriesForecast {
            historical: vec![PeriodBucket {
                period_start: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                total_emissions: avg,
            }],
            forecast,
            trend: TrendModel {
                slope: 0.0,
                intercept: avg,
                direction: TrendDirection::Stable,
                degraded: false,
            },
            degraded: false,
            seasonality_applied: false,
        }
    }

    fn result_with(categories: &[(Category, f64)]) -> ForecastResult {
        let overall_avg: f64 = categories.iter().map(|(_, avg)| avg).sum();
        let overall = flat_series(overall_avg, 3);
        let metrics = crate::forecast::ForecastMetrics {
            avg_historical: overall_avg,
            avg_forecast: overall_avg,
            total_forecast: overall_avg * 3.0,
            change_percentage: 0.0,
            trend_direction: TrendDirection::Stable,
        };

        ForecastResult {
            frequency: Frequency::Monthly,
            periods: 3,
            overall,
            by_category: categories
                .iter()
                .map(|&(category, avg)| (category, flat_series(avg, 3)))
                .collect(),
            metrics,
            degraded: false,
        }
    }

    #[test]
    fn test_band_boundaries_map_to_lower_severity() {
        assert_eq!(classify(0.0), Severity::OnTrack);
        assert_eq!(classify(-3.0), Severity::OnTrack);
        assert_eq!(classify(0.1), Severity::Warning);
        assert_eq!(classify(5.0), Severity::Warning);
        assert_eq!(classify(5.1), Severity::Medium);
        assert_eq!(classify(10.0), Severity::Medium);
        assert_eq!(classify(10.1), Severity::High);
        assert_eq!(classify(20.0), Severity::High);
        assert_eq!(classify(20.1), Severity::Critical);
        assert_eq!(classify(250.0), Severity::Critical);
    }

    #[test]
    fn test_statuses_and_differences() {
        let forecast = result_with(&[(Category::Energy, 130.0), (Category::Materials, 90.0)]);
        let budget = BudgetModel::from_entries(
            [(Category::Energy, 100.0), (Category::Materials, 100.0)],
            BudgetCadence::Monthly,
        );

        let result = compare(&forecast, &budget);

        let energy = result.by_category.get(&Category::Energy).unwrap();
        assert_eq!(energy.status, Severity::Critical);
        assert!((energy.difference - 30.0).abs() < 1e-9);
        assert!((energy.difference_pct.unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(energy.periods.len(), 3);

        let materials = result.by_category.get(&Category::Materials).unwrap();
        assert_eq!(materials.status, Severity::OnTrack);

        // Overall: 220 forecast against 200 budget = +10%, medium band.
        let overall = result.overall.as_ref().unwrap();
        assert_eq!(overall.status, Severity::Medium);
    }

    #[test]
    fn test_zero_budget_is_critical_with_sentinel() {
        let forecast = result_with(&[(Category::Goods, 50.0)]);
        let budget = BudgetModel::from_entries([(Category::Goods, 0.0)], BudgetCadence::Monthly);

        let result = compare(&forecast, &budget);
        let goods = result.by_category.get(&Category::Goods).unwrap();

        assert_eq!(goods.status, Severity::Critical);
        assert!(goods.difference_pct.is_none());

        // The sentinel must survive JSON encoding without NaN/inf.
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"difference_pct\":null"));
        assert!(!json.contains("inf"));
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn test_unbudgeted_categories_are_excluded() {
        let forecast = result_with(&[(Category::Energy, 80.0), (Category::Services, 40.0)]);
        let budget = BudgetModel::from_entries([(Category::Energy, 100.0)], BudgetCadence::Monthly);

        let result = compare(&forecast, &budget);
        assert!(result.by_category.contains_key(&Category::Energy));
        assert!(!result.by_category.contains_key(&Category::Services));
    }

    #[test]
    fn test_summary_worst_status_and_requires_action() {
        let forecast = result_with(&[(Category::Energy, 106.0), (Category::Materials, 90.0)]);
        let budget = BudgetModel::from_entries(
            [(Category::Energy, 100.0), (Category::Materials, 100.0)],
            BudgetCadence::Monthly,
        );

        let result = compare(&forecast, &budget);

        // Energy +6% => medium; overall 196 vs 200 => on_track.
        assert_eq!(result.summary.overall_status, Severity::Medium);
        assert!(result.summary.requires_action);
        assert_eq!(result.summary.categories_over_budget, 1);
        assert_eq!(result.summary.categories_under_budget, 1);
        assert_eq!(result.summary.severity_counts[&Severity::OnTrack], 2);
        assert_eq!(result.summary.severity_counts[&Severity::Medium], 1);
    }

    #[test]
    fn test_warning_band_does_not_require_action() {
        let forecast = result_with(&[(Category::Energy, 103.0)]);
        let budget = BudgetModel::from_entries([(Category::Energy, 100.0)], BudgetCadence::Monthly);

        let result = compare(&forecast, &budget);
        assert_eq!(result.summary.overall_status, Severity::Warning);
        assert!(!result.summary.requires_action);
    }

    #[test]
    fn test_alerts_sorted_worst_first() {
        let forecast = result_with(&[
            (Category::Energy, 108.0),       // +8% medium
            (Category::AirTravel, 140.0),    // +40% critical
            (Category::Materials, 115.0),    // +15% high
        ]);
        let budget = BudgetModel::from_entries(
            [
                (Category::Energy, 100.0),
                (Category::AirTravel, 100.0),
                (Category::Materials, 100.0),
            ],
            BudgetCadence::Monthly,
        );

        let result = compare(&forecast, &budget);
        let severities: Vec<Severity> = result.alerts.iter().map(|a| a.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
        assert_eq!(result.alerts[0].category, Some(Category::AirTravel));
    }

    #[test]
    fn test_comparator_is_pure() {
        let forecast = result_with(&[(Category::Energy, 130.0)]);
        let budget = BudgetModel::from_entries([(Category::Energy, 100.0)], BudgetCadence::Monthly);

        let first = compare(&forecast, &budget);
        let second = compare(&forecast, &budget);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

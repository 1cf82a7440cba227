use crate::schema::{Category, EmissionRecord, Frequency};
use crate::utils::{month_key, month_start, month_starts_in_span, quarter_key, quarter_start};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One contiguous calendar period with its aggregated emission total.
/// Series are chronological and gap-free: a period with no matching
/// records still appears with a zero total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub period_start: NaiveDate,
    pub total_emissions: f64,
}

impl PeriodBucket {
    /// Period key: `YYYY-MM` for monthly series, `YYYY-Qn` for quarterly.
    pub fn key(&self, frequency: Frequency) -> String {
        match frequency {
            Frequency::Monthly => month_key(self.period_start),
            Frequency::Quarterly => quarter_key(self.period_start),
        }
    }
}

/// Bucketed view of a record set: one overall series plus one series
/// per category present (or per allow-listed category present).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub frequency: Frequency,
    pub overall: Vec<PeriodBucket>,
    pub by_category: BTreeMap<Category, Vec<PeriodBucket>>,
}

/// Groups records into ordered periodic buckets.
///
/// All series (overall and per category) share the period axis spanned
/// by the full record set, so per-category outputs can be merged
/// order-independently. Quarterly output is the rollup of the monthly
/// aggregation, never an independent re-aggregation, which keeps the
/// two views additively consistent.
pub fn aggregate_records(
    records: &[EmissionRecord],
    frequency: Frequency,
    categories: Option<&[Category]>,
) -> AggregatedSeries {
    let monthly = aggregate_monthly(records, categories);

    match frequency {
        Frequency::Monthly => monthly,
        Frequency::Quarterly => AggregatedSeries {
            frequency: Frequency::Quarterly,
            overall: rollup_quarterly(&monthly.overall),
            by_category: monthly
                .by_category
                .into_iter()
                .map(|(category, buckets)| (category, rollup_quarterly(&buckets)))
                .collect(),
        },
    }
}

/// Monthly aggregation over the record set's full span, zero-filled.
pub fn aggregate_monthly(
    records: &[EmissionRecord],
    categories: Option<&[Category]>,
) -> AggregatedSeries {
    let mut result = AggregatedSeries {
        frequency: Frequency::Monthly,
        overall: Vec::new(),
        by_category: BTreeMap::new(),
    };

    if records.is_empty() {
        return result;
    }

    let span_start = records.iter().map(|r| r.date).min().unwrap();
    let span_end = records.iter().map(|r| r.date).max().unwrap();
    let months = month_starts_in_span(span_start, span_end);

    let mut overall: BTreeMap<NaiveDate, f64> =
        months.iter().map(|&m| (m, 0.0)).collect();
    let mut per_category: BTreeMap<Category, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for record in records {
        let period = month_start(record.date);
        *overall.get_mut(&period).unwrap() += record.emissions_kg;

        if let Some(allowed) = categories {
            if !allowed.contains(&record.category) {
                continue;
            }
        }

        let series = per_category
            .entry(record.category)
            .or_insert_with(|| months.iter().map(|&m| (m, 0.0)).collect());
        *series.get_mut(&period).unwrap() += record.emissions_kg;
    }

    result.overall = to_buckets(overall);
    result.by_category = per_category
        .into_iter()
        .map(|(category, series)| (category, to_buckets(series)))
        .collect();
    result
}

/// Sums monthly buckets into their calendar quarters. Edge quarters
/// covering fewer than three months are reported as-is.
pub fn rollup_quarterly(monthly: &[PeriodBucket]) -> Vec<PeriodBucket> {
    let mut quarters: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for bucket in monthly {
        *quarters.entry(quarter_start(bucket.period_start)).or_default() +=
            bucket.total_emissions;
    }

    to_buckets(quarters)
}

fn to_buckets(series: BTreeMap<NaiveDate, f64>) -> Vec<PeriodBucket> {
    series
        .into_iter()
        .map(|(period_start, total_emissions)| PeriodBucket {
            period_start,
            total_emissions,
        })
        .collect()
}

use crate::error::{ForecastError, Result};
use crate::schema::{Category, Frequency};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Cadence the budget figures were declared in. Normalization to the
/// forecast frequency happens at comparison time, never at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetCadence {
    Monthly,
    Annual,
}

/// Validated per-category carbon budgets.
///
/// Construction is all-or-nothing: any validation error aborts the
/// whole model and every message is reported together, so a partially
/// applied budget can never reach the comparator. Duplicate categories
/// are the one soft case — last row wins and a warning is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetModel {
    by_category: BTreeMap<Category, f64>,
    cadence: BudgetCadence,
    warnings: Vec<String>,
}

/// Share of one category in the total budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetShare {
    pub value: f64,
    pub percentage: f64,
}

/// Overview of a loaded budget, in its declared cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_categories: usize,
    pub cadence: BudgetCadence,
    pub total_budget: f64,
    pub by_category: BTreeMap<Category, BudgetShare>,
}

impl BudgetModel {
    /// Loads and validates a budget CSV. The file needs a category
    /// column (`Categorie`) and exactly one budget-figure column; a
    /// `mensuel`/`monthly` column name declares monthly figures,
    /// `annuel`/`annual`/`yearly` declares annual, and an unlabeled
    /// `Budget` column defaults to annual.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let headers = match csv_reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                return Err(ForecastError::BudgetValidation {
                    errors: vec![format!("Error reading CSV: {}", e)],
                })
            }
        };

        let category_idx = headers
            .iter()
            .position(|h| matches!(h.to_lowercase().as_str(), "categorie" | "category"));
        if category_idx.is_none() {
            errors.push("Missing required column: Categorie".to_string());
        }

        let budget_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.to_lowercase().contains("budget"))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let budget_idx = match budget_columns.as_slice() {
            [] => {
                errors.push(
                    "No budget column found. Expected a column like 'Budget_mensuel', \
                     'Budget_annuel' or 'Budget'"
                        .to_string(),
                );
                None
            }
            [(idx, _)] => Some(*idx),
            many => {
                let names: Vec<&str> = many.iter().map(|(_, name)| name.as_str()).collect();
                errors.push(format!(
                    "Ambiguous budget columns: {}",
                    names.join(", ")
                ));
                None
            }
        };

        let cadence = budget_columns
            .first()
            .map(|(_, name)| detect_cadence(name))
            .unwrap_or(BudgetCadence::Annual);

        let mut by_category: BTreeMap<Category, f64> = BTreeMap::new();
        let mut row_count = 0usize;

        for (row_number, record) in csv_reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    errors.push(format!("Error reading CSV row {}: {}", row_number + 1, e));
                    continue;
                }
            };
            row_count += 1;

            let (Some(category_idx), Some(budget_idx)) = (category_idx, budget_idx) else {
                continue;
            };

            let raw_category = record.get(category_idx).unwrap_or("").to_string();
            let category = match raw_category.parse::<Category>() {
                Ok(category) => category,
                Err(_) => {
                    errors.push(format!(
                        "Unknown category '{}' at row {}",
                        raw_category,
                        row_number + 1
                    ));
                    continue;
                }
            };

            let raw_value = record.get(budget_idx).unwrap_or("").to_string();
            let value = match raw_value.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    errors.push(format!(
                        "Invalid budget value for category '{}': {}",
                        category, raw_value
                    ));
                    continue;
                }
            };

            if value < 0.0 {
                errors.push(format!(
                    "Negative budget value for category '{}': {}",
                    category, value
                ));
                continue;
            }

            if by_category.insert(category, value).is_some() {
                warnings.push(format!(
                    "Duplicate category '{}': last value wins",
                    category
                ));
            }
        }

        if row_count == 0 && errors.is_empty() {
            errors.push("Budget file is empty".to_string());
        }

        if !errors.is_empty() {
            return Err(ForecastError::BudgetValidation { errors });
        }

        debug!(
            "Loaded budget: {} categories, cadence {:?}, {} warning(s)",
            by_category.len(),
            cadence,
            warnings.len()
        );

        Ok(Self {
            by_category,
            cadence,
            warnings,
        })
    }

    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Programmatic construction, mainly for callers that already hold
    /// validated figures.
    pub fn from_entries<I>(entries: I, cadence: BudgetCadence) -> Self
    where
        I: IntoIterator<Item = (Category, f64)>,
    {
        Self {
            by_category: entries.into_iter().collect(),
            cadence,
            warnings: Vec::new(),
        }
    }

    /// Budget for one category, normalized to one period of `frequency`.
    pub fn category_budget(&self, category: Category, frequency: Frequency) -> Option<f64> {
        self.by_category
            .get(&category)
            .map(|&value| normalize(value, self.cadence, frequency))
    }

    /// Overall budget (sum of the category budgets), normalized to one
    /// period of `frequency`.
    pub fn overall_budget(&self, frequency: Frequency) -> f64 {
        normalize(self.raw_total(), self.cadence, frequency)
    }

    /// Categories carrying a budget, with figures in the declared cadence.
    pub fn by_category(&self) -> &BTreeMap<Category, f64> {
        &self.by_category
    }

    pub fn cadence(&self) -> BudgetCadence {
        self.cadence
    }

    /// Validation warnings recorded during the load (duplicates).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn summary(&self) -> BudgetSummary {
        let total = self.raw_total();

        let by_category = self
            .by_category
            .iter()
            .map(|(&category, &value)| {
                let percentage = if total > 0.0 {
                    value / total * 100.0
                } else {
                    0.0
                };
                (category, BudgetShare { value, percentage })
            })
            .collect();

        BudgetSummary {
            total_categories: self.by_category.len(),
            cadence: self.cadence,
            total_budget: total,
            by_category,
        }
    }

    fn raw_total(&self) -> f64 {
        self.by_category.values().sum()
    }
}

fn detect_cadence(column_name: &str) -> BudgetCadence {
    let name = column_name.to_lowercase();
    if name.contains("mensuel") || name.contains("monthly") {
        BudgetCadence::Monthly
    } else if name.contains("annuel") || name.contains("annual") || name.contains("yearly") {
        BudgetCadence::Annual
    } else {
        BudgetCadence::Annual
    }
}

fn normalize(value: f64, cadence: BudgetCadence, frequency: Frequency) -> f64 {
    match cadence {
        BudgetCadence::Monthly => value * frequency.months_per_period() as f64,
        BudgetCadence::Annual => value / frequency.periods_per_year() as f64,
    }
}

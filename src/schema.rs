use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of emission categories produced by the upstream
/// categorizer. Wire identifiers are pinned to the ones invoice
/// enrichment emits; unknown identifiers are rejected at the ingestion
/// boundary, never inside the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Category {
    #[serde(rename = "materiaux")]
    #[schemars(description = "Construction and raw materials purchases")]
    Materials,

    #[serde(rename = "services")]
    #[schemars(description = "Contracted services, including digital services and hosting")]
    Services,

    #[serde(rename = "equipements")]
    #[schemars(description = "Equipment and hardware purchases")]
    Equipment,

    #[serde(rename = "voyages_aeriens")]
    #[schemars(description = "Air travel")]
    AirTravel,

    #[serde(rename = "transport_routier")]
    #[schemars(description = "Road transport: fleet, taxis, deliveries")]
    RoadTransport,

    #[serde(rename = "energie")]
    #[schemars(description = "Electricity, gas and other energy consumption")]
    Energy,

    #[serde(rename = "achat")]
    #[schemars(description = "General procurement not covered by a more specific category")]
    Purchasing,

    #[serde(rename = "approvisionnement")]
    #[schemars(description = "Supply chain, stock and warehousing")]
    Supply,

    #[serde(rename = "article")]
    #[schemars(description = "Finished goods and merchandise")]
    Goods,

    #[serde(rename = "autres")]
    #[schemars(description = "Catch-all for invoice lines no rule matched")]
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Materials,
        Category::Services,
        Category::Equipment,
        Category::AirTravel,
        Category::RoadTransport,
        Category::Energy,
        Category::Purchasing,
        Category::Supply,
        Category::Goods,
        Category::Other,
    ];

    /// Wire identifier, as found in enriched invoice data and budget files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Materials => "materiaux",
            Category::Services => "services",
            Category::Equipment => "equipements",
            Category::AirTravel => "voyages_aeriens",
            Category::RoadTransport => "transport_routier",
            Category::Energy => "energie",
            Category::Purchasing => "achat",
            Category::Supply => "approvisionnement",
            Category::Goods => "article",
            Category::Other => "autres",
        }
    }

    /// Human-readable English label, used in alert and recommendation text.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Materials => "materials",
            Category::Services => "services",
            Category::Equipment => "equipment",
            Category::AirTravel => "air travel",
            Category::RoadTransport => "road transport",
            Category::Energy => "energy",
            Category::Purchasing => "purchasing",
            Category::Supply => "supply chain",
            Category::Goods => "goods",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ForecastError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketing cadence for aggregation and forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[schemars(description = "Calendar-month buckets")]
    Monthly,

    #[schemars(description = "Calendar-quarter buckets, rolled up from the monthly aggregation")]
    Quarterly,
}

impl Frequency {
    pub fn months_per_period(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
        }
    }
}

/// One categorized invoice line. Values are kilograms of CO2
/// equivalent, the single canonical unit of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmissionRecord {
    #[schemars(description = "Invoice date")]
    pub date: NaiveDate,

    #[schemars(description = "Emission category assigned by the upstream categorizer")]
    pub category: Category,

    #[schemars(description = "Emissions in kg CO2e. Non-negative.")]
    pub emissions_kg: f64,
}

impl EmissionRecord {
    /// Checked constructor for the ingestion boundary. Rejects negative
    /// emission values; the record source is expected to have already
    /// rejected malformed dates and unknown categories.
    pub fn new(date: NaiveDate, category: Category, emissions_kg: f64) -> Result<Self> {
        if emissions_kg < 0.0 {
            return Err(ForecastError::NegativeEmissions {
                date: date.to_string(),
                value: emissions_kg,
            });
        }
        Ok(Self {
            date,
            category,
            emissions_kg,
        })
    }
}

/// Invocation parameters for a forecast run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForecastRequest {
    #[schemars(description = "Number of future periods to project. Must be positive.")]
    pub periods: usize,

    #[schemars(description = "Bucketing cadence of the output series")]
    pub frequency: Frequency,

    #[serde(default)]
    #[schemars(
        description = "Optional allow-list. When set, per-category series are limited to these categories; the overall series always covers all records."
    )]
    pub categories: Option<Vec<Category>>,

    #[serde(default)]
    #[schemars(
        description = "Anchor for the first projected period when the record set is empty. Ignored whenever history exists."
    )]
    pub origin: Option<NaiveDate>,
}

impl ForecastRequest {
    pub fn new(periods: usize, frequency: Frequency) -> Self {
        Self {
            periods,
            frequency,
            categories: None,
            origin: None,
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_origin(mut self, origin: NaiveDate) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ForecastRequest)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

use crate::compare::{ComparisonResult, EntityComparison, Severity};
use crate::schema::Category;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => Priority::High,
            Severity::Medium => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

/// One actionable reduction suggestion, generated deterministically
/// from `(entity, status)`. No free text: titles and actions come from
/// a static template table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// None for the overall series.
    pub category: Option<Category>,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
}

/// Emits one recommendation per entity whose status is warning or
/// worse, ranked by descending severity and then descending overrun.
pub fn recommend(comparison: &ComparisonResult) -> Vec<Recommendation> {
    let mut flagged: Vec<(Option<Category>, &EntityComparison)> = Vec::new();

    if let Some(overall) = &comparison.overall {
        if overall.status > Severity::OnTrack {
            flagged.push((None, overall));
        }
    }
    for (&category, entity) in &comparison.by_category {
        if entity.status > Severity::OnTrack {
            flagged.push((Some(category), entity));
        }
    }

    flagged.sort_by(|(_, a), (_, b)| {
        b.status.cmp(&a.status).then_with(|| {
            let a_pct = a.difference_pct.unwrap_or(f64::INFINITY);
            let b_pct = b.difference_pct.unwrap_or(f64::INFINITY);
            b_pct.partial_cmp(&a_pct).unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    flagged
        .into_iter()
        .map(|(category, entity)| build_recommendation(category, entity))
        .collect()
}

fn build_recommendation(category: Option<Category>, entity: &EntityComparison) -> Recommendation {
    let title = match category {
        Some(category) => format!("Reduce emissions: {}", category.label()),
        None => "Reduce overall emissions".to_string(),
    };

    let scope = match category {
        Some(_) => "in this category",
        None => "across all categories",
    };
    let description = match entity.difference_pct {
        Some(pct) => format!(
            "Forecast exceeds budget by {:.1}%. Recommended actions to reduce emissions {}.",
            pct, scope
        ),
        None => format!(
            "Forecast exceeds a zero budget. Recommended actions to reduce emissions {}.",
            scope
        ),
    };

    Recommendation {
        category,
        priority: Priority::from_severity(entity.status),
        title,
        description,
        actions: template_actions(category)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Static action templates. Categories without a dedicated entry share
/// the generic investigate-and-reduce template.
fn template_actions(category: Option<Category>) -> &'static [&'static str] {
    match category {
        None => &[
            "Review overall carbon reduction strategy",
            "Prioritize categories with greatest impact",
            "Implement monthly emissions tracking",
        ],
        Some(Category::AirTravel) => &[
            "Prefer video conferences when possible",
            "Choose direct flights",
            "Offset unavoidable flights",
        ],
        Some(Category::RoadTransport) => &[
            "Optimize delivery routes and carpooling",
            "Transition to electric or hybrid vehicles",
            "Train drivers in eco-driving",
        ],
        Some(Category::Energy) => &[
            "Switch to green electricity",
            "Improve building insulation",
            "Replace lighting with LEDs",
        ],
        Some(Category::Materials) => &[
            "Prioritize recycled materials",
            "Implement a reuse system",
            "Choose local suppliers",
        ],
        Some(Category::Services) => &[
            "Switch to green web hosting",
            "Optimize digital services",
            "Raise team awareness of responsible digital practices",
        ],
        Some(Category::Equipment) => &[
            "Extend equipment lifespan through repair and maintenance",
            "Buy certified refurbished hardware",
            "Set up an end-of-life recycling program",
        ],
        Some(_) => &[
            "Audit the main emission sources in this category",
            "Set a quarterly reduction target",
            "Engage the largest suppliers on lower-carbon alternatives",
        ],
    }
}

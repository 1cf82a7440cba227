use anyhow::Result;
use carbon_forecast::*;
use chrono::NaiveDate;

/// Walks the whole pipeline on a synthetic two-year history: aggregate,
/// forecast six months ahead, reconcile against a budget and print the
/// alerts and recommendations.
fn main() -> Result<()> {
    let mut records = Vec::new();
    for year in [2022, 2023] {
        for month in 1..=12 {
            let date = NaiveDate::from_ymd_opt(year, month, 14).unwrap();
            // Energy rises slowly; air travel spikes every December.
            let energy = 260.0 + 4.0 * ((year - 2022) * 12 + month as i32 - 1) as f64;
            let air = if month == 12 { 420.0 } else { 140.0 };

            records.push(EmissionRecord::new(date, Category::Energy, energy)?);
            records.push(EmissionRecord::new(date, Category::AirTravel, air)?);
            records.push(EmissionRecord::new(date, Category::Materials, 90.0)?);
        }
    }

    let budget = BudgetModel::from_csv_str(
        "Categorie,Budget_mensuel\n\
         energie,280\n\
         voyages_aeriens,150\n\
         materiaux,120\n",
    )?;

    let request = ForecastRequest::new(6, Frequency::Monthly);
    let report = forecast_with_budget(&records, &request, &budget)?;

    let metrics = &report.forecast.metrics;
    println!("Forecast ({} periods, {:?}):", report.forecast.periods, report.forecast.frequency);
    println!("  historical average: {:8.1} kg CO2e", metrics.avg_historical);
    println!("  forecast average:   {:8.1} kg CO2e", metrics.avg_forecast);
    println!("  change:             {:+8.1} %", metrics.change_percentage);
    println!("  trend:              {:?}", metrics.trend_direction);

    println!("\nAlerts ({}):", report.comparison.alerts.len());
    for alert in &report.comparison.alerts {
        println!("  [{:?}] {}", alert.severity, alert.message);
    }

    println!("\nRecommendations:");
    for rec in &report.recommendations {
        println!("  ({:?}) {}", rec.priority, rec.title);
        for action in &rec.actions {
            println!("      - {}", action);
        }
    }

    println!(
        "\nOverall status: {:?} (action required: {})",
        report.comparison.summary.overall_status, report.comparison.summary.requires_action
    );

    Ok(())
}
